// SPDX-License-Identifier: (MIT OR Apache-2.0)

//! Class/interface table and the capability queries lowering relies on.

use std::collections::{HashMap, HashSet};
use std::fmt;

use thiserror::Error;

use crate::{well_known, PrimitiveKind, StaticType};

// ============================================================================
// Method signatures
// ============================================================================

/// A resolved method: owner, name, parameter and return types.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MethodSig {
    pub owner: String,
    pub name: String,
    pub params: Vec<StaticType>,
    pub ret: StaticType,
    pub is_static: bool,
    /// Calls through an interface owner use interface dispatch.
    pub owner_is_interface: bool,
}

impl MethodSig {
    pub fn instance(
        owner: impl Into<String>,
        name: impl Into<String>,
        params: Vec<StaticType>,
        ret: StaticType,
    ) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
            params,
            ret,
            is_static: false,
            owner_is_interface: false,
        }
    }

    pub fn static_fn(
        owner: impl Into<String>,
        name: impl Into<String>,
        params: Vec<StaticType>,
        ret: StaticType,
    ) -> Self {
        Self {
            is_static: true,
            ..Self::instance(owner, name, params, ret)
        }
    }

    pub fn on_interface(mut self) -> Self {
        self.owner_is_interface = true;
        self
    }

    pub fn arity(&self) -> usize {
        self.params.len()
    }

    /// Method descriptor, e.g. `(Ljava/lang/Object;)LIterator;`.
    pub fn descriptor(&self) -> String {
        let params: String = self.params.iter().map(StaticType::descriptor).collect();
        format!("({}){}", params, self.ret.descriptor())
    }
}

impl fmt::Display for MethodSig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}{}", self.owner, self.name, self.descriptor())
    }
}

// ============================================================================
// Type definitions
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeDefKind {
    Class,
    Interface,
}

/// A class or interface known to the backend.
#[derive(Debug, Clone)]
pub struct TypeDef {
    pub name: String,
    pub kind: TypeDefKind,
    pub superclass: Option<String>,
    /// Implemented interfaces (for an interface: its superinterfaces),
    /// in declaration order.
    pub interfaces: Vec<String>,
    pub methods: Vec<MethodSig>,
}

impl TypeDef {
    pub fn class(name: impl Into<String>) -> Self {
        let name = name.into();
        let superclass = (name != well_known::OBJECT).then(|| well_known::OBJECT.to_string());
        Self {
            name,
            kind: TypeDefKind::Class,
            superclass,
            interfaces: Vec::new(),
            methods: Vec::new(),
        }
    }

    pub fn interface(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: TypeDefKind::Interface,
            superclass: None,
            interfaces: Vec::new(),
            methods: Vec::new(),
        }
    }

    pub fn extends(mut self, superclass: impl Into<String>) -> Self {
        self.superclass = Some(superclass.into());
        self
    }

    pub fn implements(mut self, interface: impl Into<String>) -> Self {
        self.interfaces.push(interface.into());
        self
    }

    pub fn method(mut self, name: &str, params: Vec<StaticType>, ret: StaticType) -> Self {
        let mut sig = MethodSig::instance(self.name.clone(), name, params, ret);
        sig.owner_is_interface = self.is_interface();
        self.methods.push(sig);
        self
    }

    pub fn static_method(mut self, name: &str, params: Vec<StaticType>, ret: StaticType) -> Self {
        let sig = MethodSig::static_fn(self.name.clone(), name, params, ret);
        self.methods.push(sig);
        self
    }

    pub fn is_interface(&self) -> bool {
        self.kind == TypeDefKind::Interface
    }

    fn declared(&self, name: &str, arity: usize, is_static: bool) -> Option<&MethodSig> {
        self.methods
            .iter()
            .find(|m| m.name == name && m.arity() == arity && m.is_static == is_static)
    }
}

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("unknown type '{0}'")]
    UnknownType(String),

    #[error("type '{0}' is already defined")]
    DuplicateType(String),

    #[error("no method '{name}' taking {arity} argument(s) on '{owner}'")]
    UnknownMethod {
        owner: String,
        name: String,
        arity: usize,
    },
}

// ============================================================================
// Type table
// ============================================================================

/// All classes and interfaces visible to one compilation unit.
#[derive(Debug, Clone)]
pub struct TypeTable {
    defs: HashMap<String, TypeDef>,
}

impl Default for TypeTable {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeTable {
    /// Table pre-populated with `Object`, `String`, the boxed primitive
    /// classes and the iteration capabilities.
    pub fn new() -> Self {
        let mut defs = HashMap::new();
        let mut add = |def: TypeDef| {
            defs.insert(def.name.clone(), def);
        };

        add(TypeDef::class(well_known::OBJECT));
        add(TypeDef::class(well_known::STRING));
        for kind in PrimitiveKind::ALL {
            add(TypeDef::class(kind.boxed_name()));
        }

        let mut iterator = TypeDef::interface(well_known::ITERATOR);
        iterator.methods = vec![well_known::iterator_has_next(), well_known::iterator_next()];
        add(iterator);

        let mut iterable = TypeDef::interface(well_known::ITERABLE);
        iterable.methods = vec![well_known::iterable_iterator()];
        add(iterable);

        let mut enumerator = TypeDef::interface(well_known::ENUMERATOR);
        enumerator.methods = vec![
            well_known::enumerator_has_more(),
            well_known::enumerator_next(),
        ];
        add(enumerator);

        Self { defs }
    }

    pub fn define(&mut self, def: TypeDef) -> Result<(), TypeError> {
        if self.defs.contains_key(&def.name) {
            return Err(TypeError::DuplicateType(def.name));
        }
        self.defs.insert(def.name.clone(), def);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&TypeDef> {
        self.defs.get(name)
    }

    pub fn lookup(&self, name: &str) -> Result<&TypeDef, TypeError> {
        self.get(name)
            .ok_or_else(|| TypeError::UnknownType(name.to_string()))
    }

    /// The type itself followed by its superclasses, nearest first.
    fn class_chain(&self, name: &str) -> Vec<&TypeDef> {
        let mut chain = Vec::new();
        let mut seen = HashSet::new();
        let mut next = Some(name);
        while let Some(current) = next {
            if !seen.insert(current) {
                break;
            }
            let Some(def) = self.get(current) else {
                break;
            };
            chain.push(def);
            next = def.superclass.as_deref();
        }
        chain
    }

    /// True if `ty` is the named type or inherits it through its
    /// superclass chain or (transitively) implemented interfaces.
    pub fn is_or_implements(&self, ty: &StaticType, target: &str) -> bool {
        match ty {
            StaticType::Object(name) => {
                if target == well_known::OBJECT {
                    return true;
                }
                let mut seen = HashSet::new();
                self.name_is_or_implements(name, target, &mut seen)
            }
            StaticType::Array(_) => target == well_known::OBJECT,
            _ => false,
        }
    }

    fn name_is_or_implements<'a>(
        &'a self,
        name: &'a str,
        target: &str,
        seen: &mut HashSet<&'a str>,
    ) -> bool {
        if name == target {
            return true;
        }
        if !seen.insert(name) {
            return false;
        }
        let Some(def) = self.get(name) else {
            return false;
        };
        def.superclass
            .iter()
            .chain(def.interfaces.iter())
            .any(|parent| self.name_is_or_implements(parent, target, seen))
    }

    /// Zero-argument instance method declared on the type or one of its
    /// superclasses. Interfaces are not searched.
    pub fn find_zero_arg_method(&self, ty: &StaticType, name: &str) -> Option<&MethodSig> {
        let owner = ty.object_name()?;
        self.class_chain(owner)
            .into_iter()
            .find_map(|def| def.declared(name, 0, false))
    }

    /// Every interface the type implements, in a fixed order: if the type
    /// is itself an interface it comes first; then, for the type and each
    /// superclass (nearest first), each declared interface in declaration
    /// order followed depth-first by its superinterfaces. An interface
    /// reached twice keeps its first position.
    pub fn transitive_interfaces(&self, ty: &StaticType) -> Vec<&TypeDef> {
        let mut out = Vec::new();
        let Some(name) = ty.object_name() else {
            return out;
        };
        let mut seen = HashSet::new();
        if let Some(def) = self.get(name) {
            if def.is_interface() {
                seen.insert(def.name.as_str());
                out.push(def);
            }
        }
        for class in self.class_chain(name) {
            for iface in &class.interfaces {
                self.collect_interface(iface, &mut seen, &mut out);
            }
        }
        out
    }

    fn collect_interface<'a>(
        &'a self,
        name: &'a str,
        seen: &mut HashSet<&'a str>,
        out: &mut Vec<&'a TypeDef>,
    ) {
        if !seen.insert(name) {
            return;
        }
        if let Some(def) = self.get(name) {
            out.push(def);
            for parent in &def.interfaces {
                self.collect_interface(parent, seen, out);
            }
        }
    }

    /// Instance method lookup for ordinary calls: superclass chain first,
    /// then the transitive interfaces.
    pub fn find_method(&self, ty: &StaticType, name: &str, arity: usize) -> Option<&MethodSig> {
        let owner = match ty {
            StaticType::Object(owner) => owner.as_str(),
            StaticType::Array(_) => well_known::OBJECT,
            _ => return None,
        };
        self.class_chain(owner)
            .into_iter()
            .find_map(|def| def.declared(name, arity, false))
            .or_else(|| {
                self.transitive_interfaces(ty)
                    .into_iter()
                    .find_map(|def| def.declared(name, arity, false))
            })
    }

    pub fn find_static(&self, owner: &str, name: &str, arity: usize) -> Result<&MethodSig, TypeError> {
        self.lookup(owner)?
            .declared(name, arity, true)
            .ok_or_else(|| TypeError::UnknownMethod {
                owner: owner.to_string(),
                name: name.to_string(),
                arity,
            })
    }

    /// Assignment compatibility without widening or boxing.
    pub fn is_assignable(&self, from: &StaticType, to: &StaticType) -> bool {
        if from == to {
            return true;
        }
        match (from, to) {
            (StaticType::Null, to) => to.is_reference(),
            (StaticType::Primitive(_), _) | (_, StaticType::Primitive(_)) => false,
            (_, StaticType::Object(name)) => self.is_or_implements(from, name),
            (StaticType::Array(a), StaticType::Array(b)) => {
                a.is_reference() && b.is_reference() && self.is_assignable(a, b)
            }
            _ => false,
        }
    }
}
