//! Stable structural identity for declarations.
//!
//! Symbol handles returned by an analyzer are only meaningful within the
//! analysis run that produced them; two runs over identical source hand
//! back unrelated handles. [`DeclPtr`] replaces the handle with the
//! declaration's structural path — enclosing container plus a member
//! discriminator — which two independent runs agree on. Convert to a
//! pointer immediately after each pass; never retain raw handles across
//! pass boundaries.

use std::fmt;

use smol_str::SmolStr;
use thiserror::Error;

use crate::analyzer::{DeclKind, Declaration};

/// Member discriminator within a container.
///
/// Callable members carry an erased parameter descriptor (arity); types
/// and fields need none. Overloads of the same arity collapse onto one
/// pointer, which is acceptable for a textual pre-filter feeding real
/// analysis.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MemberKey {
    /// The container itself (a class, interface, enum, or record).
    Type,
    /// A field, discriminated by name alone.
    Field(SmolStr),
    /// A method or constructor, discriminated by name and arity.
    Method { name: SmolStr, arity: u8 },
}

/// A pointer to a declaration, valid across analysis runs.
///
/// Two pointers are equal iff their structural paths are equal, regardless
/// of which run produced them. Equality never consults an analyzer.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DeclPtr {
    /// Qualified name of the enclosing container: the package-qualified
    /// type name for members, the package name for top-level types.
    pub container: SmolStr,
    pub member: MemberKey,
}

/// Why a declaration could not be given a structural identity.
///
/// These are skipped during indexing (with a log line), never indexed
/// under an ambiguous identity and never fatal to a request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentityError {
    #[error("synthetic declaration `{0}` has no stable identity")]
    Synthetic(SmolStr),
    #[error("declaration `{0}` has no resolvable enclosing container")]
    NoContainer(SmolStr),
}

impl DeclPtr {
    /// Build a pointer from an analyzer declaration.
    ///
    /// Constructors use the enclosing type's simple name as their
    /// discriminator base, since `<init>`-style members have no stable
    /// self-name of their own.
    pub fn from_decl(decl: &Declaration) -> Result<DeclPtr, IdentityError> {
        if decl.synthetic {
            return Err(IdentityError::Synthetic(decl.name.clone()));
        }
        if decl.container.is_empty() && !matches!(decl.kind, DeclKind::Class | DeclKind::Interface | DeclKind::Enum | DeclKind::Record)
        {
            return Err(IdentityError::NoContainer(decl.name.clone()));
        }
        let member = match decl.kind {
            DeclKind::Class | DeclKind::Interface | DeclKind::Enum | DeclKind::Record => {
                // For a type, the structural path is the type's own
                // qualified name; its enclosing container is the package.
                return Ok(DeclPtr::to_class(&decl.container, &decl.name));
            }
            DeclKind::Field => MemberKey::Field(decl.name.clone()),
            DeclKind::Method => MemberKey::Method {
                name: decl.name.clone(),
                arity: decl.arity,
            },
            DeclKind::Constructor => MemberKey::Method {
                name: simple_name(&decl.container),
                arity: decl.arity,
            },
        };
        Ok(DeclPtr {
            container: decl.container.clone(),
            member,
        })
    }

    /// Build a type-level pointer from textual names alone.
    ///
    /// Used to bootstrap lookups (e.g. "where is class `Foo` in package
    /// `com.example` declared") without an analyzer handle in hand.
    pub fn to_class(package: &str, simple_name: &str) -> DeclPtr {
        let container = if package.is_empty() {
            SmolStr::new(simple_name)
        } else {
            SmolStr::new(format!("{package}.{simple_name}"))
        };
        DeclPtr {
            container,
            member: MemberKey::Type,
        }
    }

    /// The identifier a reference to this declaration appears as in text.
    ///
    /// This is what the candidate filter greps for.
    pub fn simple_name(&self) -> SmolStr {
        match &self.member {
            MemberKey::Type => simple_name(&self.container),
            MemberKey::Field(name) => name.clone(),
            MemberKey::Method { name, .. } => name.clone(),
        }
    }

}

fn simple_name(qualified: &str) -> SmolStr {
    match qualified.rfind('.') {
        Some(dot) => SmolStr::new(&qualified[dot + 1..]),
        None => SmolStr::new(qualified),
    }
}

impl fmt::Display for DeclPtr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.member {
            MemberKey::Type => write!(f, "{}", self.container),
            MemberKey::Field(name) => write!(f, "{}#{}", self.container, name),
            MemberKey::Method { name, arity } => {
                write!(f, "{}#{}({})", self.container, name, arity)
            }
        }
    }
}
