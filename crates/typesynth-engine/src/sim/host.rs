//! In-memory type registry
//!
//! Types enter the registry two ways. [`InMemoryHost::define`] registers a
//! type the way an application's own code would be present: no scope checks.
//! [`Loader::materialize`] is the guarded path used for synthesized types and
//! enforces the scope rules a real host would.

use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use rustc_hash::{FxHashMap, FxHashSet};
use tracing::debug;
use typesynth_ir::{
    validate_type, Invoke, InvokeKind, MemberRef, Modifiers, ScopeId, TypeBuilder, TypeDescriptor,
    TypeName, Visitor,
};

use crate::config::ElevationConfig;
use crate::error::SynthesisError;
use crate::host::{Introspector, Loader, ReflectedType};

/// Name of the root type every hierarchy ends in
pub const ROOT_TYPE: &str = "java.lang.Object";

/// Registry of defined types, usable as both host ports
#[derive(Debug)]
pub struct InMemoryHost {
    types: RwLock<FxHashMap<TypeName, Arc<TypeDescriptor>>>,
    sealed: RwLock<FxHashSet<ScopeId>>,
    config: ElevationConfig,
    materialized: Mutex<Vec<TypeName>>,
}

impl Default for InMemoryHost {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryHost {
    /// Host holding only the root type, with the default platform prefixes sealed
    pub fn new() -> Self {
        Self::with_config(ElevationConfig::default())
    }

    /// Host whose sealed platform scopes follow `config`
    pub fn with_config(config: ElevationConfig) -> Self {
        let host = Self {
            types: RwLock::new(FxHashMap::default()),
            sealed: RwLock::new(FxHashSet::default()),
            config,
            materialized: Mutex::new(Vec::new()),
        };
        let root = root_type();
        host.types.write().insert(root.name().clone(), Arc::new(root));
        host
    }

    /// The root type's name
    pub fn root() -> TypeName {
        TypeName::new(ROOT_TYPE)
    }

    /// Register an application type
    pub fn define(&self, descriptor: TypeDescriptor) -> Result<TypeName, SynthesisError> {
        validate_type(&descriptor)?;
        let mut types = self.types.write();
        let name = descriptor.name().clone();
        if types.contains_key(&name) {
            return Err(SynthesisError::NameCollision {
                name: name.to_string(),
            });
        }
        types.insert(name.clone(), Arc::new(descriptor));
        Ok(name)
    }

    /// Refuse all further materialization into `scope`
    pub fn seal_scope(&self, scope: ScopeId) {
        self.sealed.write().insert(scope);
    }

    pub fn is_sealed(&self, scope: &ScopeId) -> bool {
        self.config.is_platform_scope(scope) || self.sealed.read().contains(scope)
    }

    pub fn contains(&self, name: &TypeName) -> bool {
        self.types.read().contains_key(name)
    }

    pub fn descriptor(&self, name: &TypeName) -> Option<Arc<TypeDescriptor>> {
        self.types.read().get(name).cloned()
    }

    /// Types accepted through [`Loader::materialize`], in order
    pub fn materialized(&self) -> Vec<TypeName> {
        self.materialized.lock().clone()
    }

    /// `name` followed by each of its supertypes, up to the root
    pub fn ancestors(&self, name: &TypeName) -> Vec<TypeName> {
        let types = self.types.read();
        let mut chain = Vec::new();
        let mut next = Some(name.clone());
        while let Some(current) = next {
            next = types.get(&current).and_then(|d| d.supertype().cloned());
            chain.push(current);
        }
        chain
    }

    /// Whether `sub` is `sup` or one of its descendants
    pub fn is_subtype(&self, sub: &TypeName, sup: &TypeName) -> bool {
        self.ancestors(sub).iter().any(|t| t == sup)
    }

    /// Method declared directly on `owner` with the signature of `like`
    pub fn declared_method(&self, owner: &TypeName, like: &MemberRef) -> Option<MemberRef> {
        let descriptor = self.descriptor(owner)?;
        descriptor
            .find_method(&like.name, &like.params)
            .map(|def| def.member().clone())
    }
}

impl Introspector for InMemoryHost {
    fn reflect(&self, name: &TypeName) -> Option<ReflectedType> {
        let descriptor = self.descriptor(name)?;
        Some(ReflectedType::from_descriptor(&descriptor, name.scope()))
    }
}

impl Loader for InMemoryHost {
    fn materialize(
        &self,
        descriptor: TypeDescriptor,
        scope_anchor: &TypeName,
    ) -> Result<TypeName, SynthesisError> {
        let name = descriptor.name().clone();
        if !self.contains(scope_anchor) {
            return Err(SynthesisError::UnknownType {
                name: scope_anchor.to_string(),
            });
        }

        let scope = scope_anchor.scope();
        if name.scope() != scope {
            return Err(SynthesisError::scope_violation(
                &name,
                scope_anchor,
                format!("{} is not in scope {}", name, scope),
            ));
        }
        if self.is_sealed(&scope) {
            return Err(SynthesisError::scope_violation(
                &name,
                scope_anchor,
                format!("scope {} is sealed", scope),
            ));
        }
        if let Some(supertype) = descriptor.supertype() {
            if !self.contains(supertype) {
                return Err(SynthesisError::UnknownType {
                    name: supertype.to_string(),
                });
            }
        }

        validate_type(&descriptor)?;

        let mut scan = SuperInvokeScan {
            ty: &name,
            scope: &scope,
            violation: None,
        };
        descriptor.accept(&mut scan);
        if let Some(reason) = scan.violation {
            return Err(SynthesisError::scope_violation(&name, scope_anchor, reason));
        }

        let mut types = self.types.write();
        if types.contains_key(&name) {
            return Err(SynthesisError::NameCollision {
                name: name.to_string(),
            });
        }
        types.insert(name.clone(), Arc::new(descriptor));
        drop(types);

        self.materialized.lock().push(name.clone());
        debug!("materialized {} in scope {}", name, scope);
        Ok(name)
    }
}

/// Finds super-invokes the host would not link from the type's scope
struct SuperInvokeScan<'a> {
    ty: &'a TypeName,
    scope: &'a ScopeId,
    violation: Option<String>,
}

impl Visitor for SuperInvokeScan<'_> {
    fn visit_invoke(&mut self, invoke: &Invoke) {
        if invoke.kind != InvokeKind::Super || self.violation.is_some() {
            return;
        }
        let target = &invoke.method;
        if target.modifiers.is_private() && &target.owner != self.ty {
            self.violation = Some(format!("{} is private to {}", target, target.owner));
        } else if target.modifiers.is_package_scoped() && &target.owner.scope() != self.scope {
            self.violation = Some(format!(
                "{} is package-scoped in {}",
                target,
                target.owner.scope()
            ));
        }
    }
}

fn root_type() -> TypeDescriptor {
    let mut builder = TypeBuilder::new(Modifiers::PUBLIC, InMemoryHost::root(), None);
    if let Ok(body) = builder.declare_constructor(Modifiers::PUBLIC, &[]) {
        body.return_void();
    }
    builder.finish()
}
