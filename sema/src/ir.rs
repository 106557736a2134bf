//! Instantiated representation export
//!
//! After analysis every function declaration carries the instances its call
//! sites produced. [`program`] snapshots them with types rendered as source
//! strings; [`export`] is the same snapshot as JSON.

use serde::{Deserialize, Serialize};

use crate::decl::{FnIns, Func};
use crate::sema::Sema;
use crate::types::TypeKind;

/// Every analyzed declaration and its instances
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Program {
    pub functions: Vec<FunctionEntry>,
    pub structs: Vec<StructEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionEntry {
    pub name: String,
    /// Owner struct of a method
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    pub generics: Vec<String>,
    pub instances: Vec<InstanceEntry>,
}

/// One specialization of a function
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstanceEntry {
    /// Owner generics followed by the function's own, as bound
    pub generics: Vec<String>,
    pub params: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StructEntry {
    pub name: String,
    pub generics: Vec<String>,
    pub instances: Vec<String>,
}

impl InstanceEntry {
    fn from_ins(ins: &FnIns) -> Self {
        Self {
            generics: ins.instance_key(),
            params: ins.params.iter().map(|p| p.to_str()).collect(),
            result: ins.result.as_ref().map(TypeKind::to_str),
        }
    }
}

impl FunctionEntry {
    fn from_fn(sema: &Sema, f: &Func) -> Self {
        Self {
            name: f.ident.clone(),
            owner: f.owner.map(|sid| sema.arena.strct(sid).ident.clone()),
            generics: f.all_generic_names(),
            instances: f.instances.iter().map(InstanceEntry::from_ins).collect(),
        }
    }
}

/// Snapshot of the user declarations; builtins are left out.
pub fn program(sema: &Sema) -> Program {
    let functions = sema
        .arena
        .fns
        .iter()
        .filter(|f| !f.builtin)
        .map(|f| FunctionEntry::from_fn(sema, f))
        .collect();
    let structs = sema
        .arena
        .structs
        .iter()
        .map(|s| StructEntry {
            name: s.ident.clone(),
            generics: s.generics.clone(),
            instances: s.instances.iter().map(|i| i.to_str()).collect(),
        })
        .collect();
    Program { functions, structs }
}

pub fn export(sema: &Sema) -> serde_json::Value {
    serde_json::json!(program(sema))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Span;
    use crate::decl::{Param, ParamIns};
    use crate::types::PrimKind;

    #[test]
    fn test_builtins_excluded() {
        let sema = Sema::default();
        let p = program(&sema);
        assert!(p.functions.is_empty());
        assert!(p.structs.is_empty());
    }

    #[test]
    fn test_instances_exported() {
        let mut sema = Sema::default();
        let id = sema.arena.add_fn("id", Span::default());
        let f = sema.arena.func_mut(id);
        f.generics = vec!["T".into()];
        f.params = vec![Param {
            ident: "v".into(),
            span: Span::default(),
            mutable: false,
            variadic: false,
            kind: TypeKind::Generic("T".into()),
        }];
        f.result = Some(TypeKind::Generic("T".into()));
        f.append_instance(FnIns {
            decl: Some(id),
            ident: "id".into(),
            generics: vec![PrimKind::Int.into()],
            params: vec![ParamIns::new("v", PrimKind::Int.into())],
            result: Some(PrimKind::Int.into()),
            ..FnIns::default()
        });

        let value = export(&sema);
        insta::assert_snapshot!(value.to_string(), @r#"{"functions":[{"generics":["T"],"instances":[{"generics":["int"],"params":["int"],"result":"int"}],"name":"id"}],"structs":[]}"#);
    }
}
