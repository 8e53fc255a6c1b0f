//! Package-access elevation
//!
//! A package-scoped method can only be overridden from inside its own scope.
//! To make such methods overridable from anywhere, the elevator walks the
//! ancestors of a base type and, for every ancestor `A` that declares
//! package-scoped methods, synthesizes a bridge type in `A`'s scope that
//! re-declares each of them as `protected` and delegates to `A`'s
//! implementation. Bridges are stacked: each one extends the previous bridge
//! (the first extends the base type), so the final bridge is a descendant of
//! the base with every package-scoped method of the hierarchy elevated.
//!
//! ```text
//! pac1.A { void method1() }            pac1.A$packageAccess$.. extends pac2.B$packageAccess$..
//!   ^                                      protected void method1() { super.method1() }
//! pac2.B { void method2() }            pac2.B$packageAccess$.. extends pac2.B
//!                                          protected void method2() { super.method2() }
//! ```
//!
//! Types in platform-reserved scopes are never bridged.

use std::hash::{Hash, Hasher};

use rustc_hash::FxHasher;
use tracing::{debug, info, warn};
use typesynth_ir::{MemberRef, Modifiers, Parameter, TypeBuilder, TypeDescriptor, TypeName};

use crate::config::ElevationConfig;
use crate::error::SynthesisError;
use crate::host::{Introspector, Loader, ReflectedType};

/// Synthesizes bridge chains over a host reached through its ports
#[derive(Debug)]
pub struct PackageAccessElevator<I, L> {
    introspector: I,
    loader: L,
    config: ElevationConfig,
}

impl<I: Introspector, L: Loader> PackageAccessElevator<I, L> {
    /// Create an elevator with the default configuration
    pub fn new(introspector: I, loader: L) -> Self {
        Self::with_config(introspector, loader, ElevationConfig::default())
    }

    pub fn with_config(introspector: I, loader: L, config: ElevationConfig) -> Self {
        Self {
            introspector,
            loader,
            config,
        }
    }

    pub fn config(&self) -> &ElevationConfig {
        &self.config
    }

    pub fn introspector(&self) -> &I {
        &self.introspector
    }

    pub fn loader(&self) -> &L {
        &self.loader
    }

    /// Whether `ty` declares anything to elevate
    pub fn needs_bridge(&self, ty: &ReflectedType) -> bool {
        !self.config.is_platform_scope(&ty.scope) && qualifying_methods(ty).next().is_some()
    }

    /// Name of the bridge over `ancestor` that extends `supertype`
    pub fn bridge_name(&self, ancestor: &TypeName, supertype: &TypeName) -> TypeName {
        let mut hasher = FxHasher::default();
        supertype.as_str().hash(&mut hasher);
        let discriminator = hasher.finish() as u32;
        TypeName::new(format!("{}{}{:08x}", ancestor, self.config.bridge_infix, discriminator))
    }

    /// Describe the bridge over `ancestor` extending `supertype`
    ///
    /// Stubs are `protected` and delegate to the ancestor's implementation;
    /// constructors are `public` and chain to the supertype's constructors.
    pub fn make_bridge(
        &self,
        ancestor: &ReflectedType,
        supertype: &ReflectedType,
    ) -> Result<TypeDescriptor, SynthesisError> {
        let name = self.bridge_name(&ancestor.name, &supertype.name);
        let mut modifiers = Modifiers::PUBLIC;
        if supertype.modifiers.contains(Modifiers::ABSTRACT)
            || qualifying_methods(ancestor).any(|m| m.modifiers.contains(Modifiers::ABSTRACT))
        {
            modifiers |= Modifiers::ABSTRACT;
        }
        let mut builder = TypeBuilder::new(modifiers, name, Some(supertype.name.clone()));

        for method in qualifying_methods(ancestor) {
            emit_stub(&mut builder, method)?;
        }

        let same_scope = ancestor.scope == supertype.scope;
        for constructor in &supertype.constructors {
            if constructor.modifiers.intersects(Modifiers::PRIVATE | Modifiers::FINAL) {
                continue;
            }
            if constructor.modifiers.is_package_scoped() && !same_scope {
                debug!(
                    "skipping constructor {} of {}: package-scoped outside {}",
                    constructor.signature(),
                    supertype.name,
                    ancestor.scope
                );
                continue;
            }
            let params = Parameter::positional(&constructor.params);
            let body = builder.declare_constructor(Modifiers::PUBLIC, &params)?;
            let this = body.this_local().ok_or_else(|| {
                SynthesisError::Host(format!("constructor of {} has no receiver", supertype.name))
            })?;
            let args = body.params().to_vec();
            body.invoke_super(this, constructor, None, &args);
            body.return_void();
            debug!("forwarding constructor {}", constructor);
        }

        Ok(builder.finish())
    }

    /// Synthesize the bridge chain for `base` and return the result type
    ///
    /// Returns `base` itself when no ancestor needs a bridge. This does not
    /// consult any cache; see [`crate::SynthesisContext`].
    pub fn elevate(&self, base: &TypeName) -> Result<TypeName, SynthesisError> {
        let base_type = self.reflect(base)?;
        let mut current: Option<ReflectedType> = None;
        let mut next = Some(base_type.clone());

        while let Some(ancestor) = next {
            next = match &ancestor.supertype {
                Some(name) => Some(self.reflect(name)?),
                None => None,
            };

            if !self.needs_bridge(&ancestor) {
                debug!("{} needs no bridge", ancestor.name);
                continue;
            }

            // The first bridge extends the base so the result stays a descendant of it.
            let supertype = current.take().unwrap_or_else(|| base_type.clone());

            // Left behind by an earlier attempt that failed further up the chain.
            let name = self.bridge_name(&ancestor.name, &supertype.name);
            if let Some(existing) = self.introspector.reflect(&name) {
                if existing.supertype.as_ref() == Some(&supertype.name) {
                    debug!("reusing bridge {}", name);
                    current = Some(existing);
                    continue;
                }
            }

            let descriptor = self.make_bridge(&ancestor, &supertype)?;
            debug!(
                "bridging {} as {} extends {}",
                ancestor.name,
                descriptor.name(),
                supertype.name
            );

            let bridge = match self.loader.materialize(descriptor, &ancestor.name) {
                Ok(bridge) => bridge,
                Err(err) => {
                    warn!("host refused bridge over {}: {}", ancestor.name, err);
                    return Err(err);
                }
            };
            current = Some(self.reflect(&bridge)?);
        }

        let result = current.map(|bridge| bridge.name).unwrap_or_else(|| base.clone());
        info!("elevated {} to {}", base, result);
        Ok(result)
    }

    fn reflect(&self, name: &TypeName) -> Result<ReflectedType, SynthesisError> {
        self.introspector
            .reflect(name)
            .ok_or_else(|| SynthesisError::UnknownType {
                name: name.to_string(),
            })
    }
}

/// Declared methods with none of the elevation blockers
pub fn qualifying_methods(ty: &ReflectedType) -> impl Iterator<Item = &MemberRef> + '_ {
    ty.methods
        .iter()
        .filter(|m| !m.modifiers.intersects(Modifiers::ELEVATION_BLOCKERS))
}

fn emit_stub(builder: &mut TypeBuilder, method: &MemberRef) -> Result<(), SynthesisError> {
    // Abstract methods have nothing to delegate to; re-declare them instead.
    if method.modifiers.contains(Modifiers::ABSTRACT) {
        builder.declare_abstract_method(
            Modifiers::PROTECTED,
            &method.name,
            method.value_type.clone(),
            &method.params,
        )?;
        debug!("elevating abstract {}", method);
        return Ok(());
    }

    let params = Parameter::positional(&method.params);
    let body = builder.declare_method(
        Modifiers::PROTECTED,
        &method.name,
        method.value_type.clone(),
        &params,
    )?;
    let this = body
        .this_local()
        .ok_or_else(|| SynthesisError::Host(format!("{} has no receiver", method)))?;
    let args = body.params().to_vec();
    match &method.value_type {
        Some(ty) => {
            let ret = body.local(ty.clone());
            body.invoke_super(this, method, Some(ret), &args);
            body.return_value(ret);
        }
        None => {
            body.invoke_super(this, method, None, &args);
            body.return_void();
        }
    }
    debug!("elevating {}", method);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use typesynth_ir::{MemberDescriptor, ScopeId, ValueType};

    struct NoHost;

    impl Introspector for NoHost {
        fn reflect(&self, _name: &TypeName) -> Option<ReflectedType> {
            None
        }
    }

    impl Loader for NoHost {
        fn materialize(
            &self,
            descriptor: TypeDescriptor,
            _scope_anchor: &TypeName,
        ) -> Result<TypeName, SynthesisError> {
            Err(SynthesisError::NameCollision {
                name: descriptor.name().to_string(),
            })
        }
    }

    fn reflected(name: &str, methods: Vec<MemberDescriptor>) -> ReflectedType {
        let name = TypeName::new(name);
        ReflectedType {
            scope: name.scope(),
            name,
            modifiers: Modifiers::PUBLIC,
            supertype: Some(TypeName::new("java.lang.Object")),
            fields: Vec::new(),
            methods: methods.into_iter().map(Arc::new).collect(),
            constructors: Vec::new(),
        }
    }

    fn method(owner: &str, mods: Modifiers, name: &str) -> MemberDescriptor {
        MemberDescriptor::method(TypeName::new(owner), mods, name, None, Vec::new())
    }

    #[test]
    fn test_needs_bridge_ignores_blocked_methods() {
        let elevator = PackageAccessElevator::new(NoHost, NoHost);
        for mods in [
            Modifiers::PUBLIC,
            Modifiers::PROTECTED,
            Modifiers::PRIVATE,
            Modifiers::STATIC,
            Modifiers::FINAL,
        ] {
            let ty = reflected("app.A", vec![method("app.A", mods, "m")]);
            assert!(!elevator.needs_bridge(&ty), "{mods} should block");
        }
        let ty = reflected("app.A", vec![method("app.A", Modifiers::SYNCHRONIZED, "m")]);
        assert!(elevator.needs_bridge(&ty));
    }

    #[test]
    fn test_platform_scope_never_bridged() {
        let elevator = PackageAccessElevator::new(NoHost, NoHost);
        let mut ty = reflected("java.util.List", vec![method("java.util.List", Modifiers::empty(), "m")]);
        assert!(!elevator.needs_bridge(&ty));
        ty.scope = ScopeId::new("javafx.scene");
        assert!(elevator.needs_bridge(&ty));
    }

    #[test]
    fn test_bridge_name_lives_in_ancestor_scope() {
        let elevator = PackageAccessElevator::new(NoHost, NoHost);
        let first = elevator.bridge_name(&TypeName::new("pac1.A"), &TypeName::new("pac2.B"));
        let second = elevator.bridge_name(&TypeName::new("pac1.A"), &TypeName::new("pac2.C"));
        assert!(first.as_str().starts_with("pac1.A$packageAccess$"));
        assert_eq!(first.scope(), ScopeId::new("pac1"));
        assert_eq!(first.as_str().len(), "pac1.A$packageAccess$".len() + 8);
        assert_ne!(first, second);
        assert_eq!(
            first,
            elevator.bridge_name(&TypeName::new("pac1.A"), &TypeName::new("pac2.B"))
        );
    }

    #[test]
    fn test_make_bridge_stub_shape() {
        let elevator = PackageAccessElevator::new(NoHost, NoHost);
        let ancestor = reflected(
            "pac1.A",
            vec![
                MemberDescriptor::method(
                    TypeName::new("pac1.A"),
                    Modifiers::empty(),
                    "size",
                    Some(ValueType::Int),
                    vec![ValueType::Long],
                ),
                method("pac1.A", Modifiers::PUBLIC, "open"),
            ],
        );
        let bridge = elevator.make_bridge(&ancestor, &ancestor).unwrap();
        assert_eq!(bridge.methods().len(), 1);
        let stub = &bridge.methods()[0];
        assert_eq!(stub.modifiers(), Modifiers::PROTECTED);
        assert_eq!(stub.member().params, vec![ValueType::Long]);
        assert_eq!(stub.member().value_type, Some(ValueType::Int));
        assert!(typesynth_ir::validate_type(&bridge).is_ok());
    }

    #[test]
    fn test_unknown_base() {
        let elevator = PackageAccessElevator::new(NoHost, NoHost);
        let err = elevator.elevate(&TypeName::new("app.Missing")).unwrap_err();
        assert_eq!(
            err,
            SynthesisError::UnknownType {
                name: "app.Missing".to_string()
            }
        );
    }
}
