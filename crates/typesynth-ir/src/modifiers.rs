//! Access and property modifiers for types and members

use std::fmt;

bitflags::bitflags! {
    /// Modifier flags carried by type and member descriptors
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Modifiers: u16 {
        const PUBLIC       = 1 << 0;
        const PRIVATE      = 1 << 1;
        const PROTECTED    = 1 << 2;
        const STATIC       = 1 << 3;
        const FINAL        = 1 << 4;
        const SYNCHRONIZED = 1 << 5;
        const NATIVE       = 1 << 6;
        const ABSTRACT     = 1 << 7;
    }
}

impl Modifiers {
    /// Flags that rule a method out of package-access elevation
    pub const ELEVATION_BLOCKERS: Modifiers = Modifiers::PUBLIC
        .union(Modifiers::PROTECTED)
        .union(Modifiers::PRIVATE)
        .union(Modifiers::STATIC)
        .union(Modifiers::FINAL);

    /// Package-scoped: none of public, protected or private
    pub fn is_package_scoped(self) -> bool {
        !self.intersects(Modifiers::PUBLIC | Modifiers::PROTECTED | Modifiers::PRIVATE)
    }

    /// Visible to subclasses regardless of scope
    pub fn is_inheritable_anywhere(self) -> bool {
        self.intersects(Modifiers::PUBLIC | Modifiers::PROTECTED)
    }

    pub fn is_static(self) -> bool {
        self.contains(Modifiers::STATIC)
    }

    pub fn is_private(self) -> bool {
        self.contains(Modifiers::PRIVATE)
    }
}

impl fmt::Display for Modifiers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let words = [
            (Modifiers::PUBLIC, "public"),
            (Modifiers::PROTECTED, "protected"),
            (Modifiers::PRIVATE, "private"),
            (Modifiers::ABSTRACT, "abstract"),
            (Modifiers::STATIC, "static"),
            (Modifiers::FINAL, "final"),
            (Modifiers::SYNCHRONIZED, "synchronized"),
            (Modifiers::NATIVE, "native"),
        ];
        let mut first = true;
        for (flag, word) in words {
            if self.contains(flag) {
                if !first {
                    f.write_str(" ")?;
                }
                f.write_str(word)?;
                first = false;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_package_scoped() {
        assert!(Modifiers::empty().is_package_scoped());
        assert!(Modifiers::STATIC.is_package_scoped());
        assert!(!Modifiers::PROTECTED.is_package_scoped());
        assert!(!(Modifiers::PRIVATE | Modifiers::FINAL).is_package_scoped());
    }

    #[test]
    fn test_elevation_blockers() {
        assert!(!Modifiers::empty().intersects(Modifiers::ELEVATION_BLOCKERS));
        assert!(!Modifiers::SYNCHRONIZED.intersects(Modifiers::ELEVATION_BLOCKERS));
        assert!(Modifiers::FINAL.intersects(Modifiers::ELEVATION_BLOCKERS));
        assert!(Modifiers::STATIC.intersects(Modifiers::ELEVATION_BLOCKERS));
    }

    #[test]
    fn test_display_order() {
        let mods = Modifiers::FINAL | Modifiers::PUBLIC | Modifiers::STATIC;
        assert_eq!(mods.to_string(), "public static final");
        assert_eq!(Modifiers::empty().to_string(), "");
    }
}
