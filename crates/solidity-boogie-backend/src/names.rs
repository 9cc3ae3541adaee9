// Copyright (c) Asymptotic Labs
// SPDX-License-Identifier: Apache-2.0

//! Reserved Boogie identifiers and the naming scheme for translated declarations.

use boogie_ast::Attr;
use solidity_ast::{DataLocation, FunctionKind, NodeId, SourceLocation};

pub const ADDRESS_TYPE: &str = "address_t";
pub const STRING_TYPE: &str = "string_t";
/// Marker type of number literals whose type is only fixed at their use site
pub const INT_CONST_TYPE: &str = "int_const";
pub const ERR_TYPE: &str = "__ERROR_UNSUPPORTED_TYPE";
pub const ERR_EXPR: &str = "__ERROR";

pub const BALANCE: &str = "__balance";
pub const ZERO_ADDRESS: &str = "__zero__address";
pub const NOW: &str = "__now";
pub const BLOCK_NUMBER: &str = "__block_number";

pub const TRANSFER: &str = "__transfer";
pub const SEND: &str = "__send";
pub const CALL: &str = "__call";

pub const THIS: &str = "__this";
pub const MSG_SENDER: &str = "__msg_sender";
pub const MSG_VALUE: &str = "__msg_value";

pub const VERIFIER_MAIN: &str = "__verifier_main";
pub const BOOGIE_MAIN: &str = "main";
pub const VERIFIER_SUM: &str = "__verifier_sum";
pub const VERIFIER_OLD: &str = "__verifier_old";

pub const LENGTH_SUFFIX: &str = "#length";
pub const SUM_SUFFIX: &str = "#sum";
pub const RETURN_LABEL: &str = "$return";

/// Boogie name of a declaration: `name#id` unless the name is reserved.
pub fn map_decl_name(name: &str, id: NodeId) -> String {
    match name {
        VERIFIER_MAIN => BOOGIE_MAIN.to_string(),
        "assert" | "require" | "revert" => name.to_string(),
        "this" => THIS.to_string(),
        "now" => NOW.to_string(),
        _ => format!("{}#{}", name, id),
    }
}

pub fn constructor_name(contract_id: NodeId) -> String {
    format!("__constructor#{}", contract_id)
}

/// Procedure implementing a function. Fallback functions have no name in the source.
pub fn procedure_name(name: &str, id: NodeId, kind: FunctionKind, contract_id: NodeId) -> String {
    match kind {
        FunctionKind::Constructor => constructor_name(contract_id),
        FunctionKind::Fallback if name.is_empty() => map_decl_name("fallback", id),
        _ => map_decl_name(name, id),
    }
}

/// Shadow variable holding the length of the array stored in `base`
pub fn length_name(base: &str) -> String {
    format!("{}{}", base, LENGTH_SUFFIX)
}

/// Shadow variable holding the sum of the collection stored in `base`
pub fn sum_name(base: &str) -> String {
    format!("{}{}", base, SUM_SUFFIX)
}

pub fn return_label(n: usize) -> String {
    format!("{}{}", RETURN_LABEL, n)
}

/// Opaque type of references to a struct, one per data location
pub fn struct_type_name(name: &str, def: NodeId, location: DataLocation) -> String {
    let kind = if location.is_storage() {
        "storage"
    } else {
        "memory"
    };
    format!("struct_{}_{}#{}", kind, name, def)
}

/// Map from struct references to the value of one member
pub fn member_map_name(member: &str, member_id: NodeId, location: DataLocation) -> String {
    let kind = if location.is_storage() {
        "storage"
    } else {
        "memory"
    };
    format!("{}#{}#{}", member, member_id, kind)
}

/// Allocation flags of memory structs of one type
pub fn alloc_map_name(struct_name: &str, def: NodeId) -> String {
    format!("alloc_{}#{}", struct_name, def)
}

/// Attributes pointing a check back to its source and carrying the message the prover reports
pub fn loc_attrs(loc: &SourceLocation, message: impl Into<String>) -> Vec<Attr> {
    vec![
        Attr::source_loc(&loc.file, loc.line, loc.column),
        Attr::message(message),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reserved_names() {
        assert_eq!(map_decl_name("__verifier_main", 4), "main");
        assert_eq!(map_decl_name("require", -2), "require");
        assert_eq!(map_decl_name("this", -4), "__this");
        assert_eq!(map_decl_name("now", -5), "__now");
    }

    #[test]
    fn ordinary_names_carry_ids() {
        assert_eq!(map_decl_name("x", 12), "x#12");
        // shadowed locals and unnamed returns stay distinct
        assert_ne!(map_decl_name("x", 12), map_decl_name("x", 13));
        assert_ne!(map_decl_name("", 20), map_decl_name("", 21));
        assert_eq!(map_decl_name("x", 12), map_decl_name("x", 12));
    }

    #[test]
    fn procedure_names() {
        assert_eq!(procedure_name("f", 9, FunctionKind::Function, 2), "f#9");
        assert_eq!(procedure_name("", 9, FunctionKind::Constructor, 2), "__constructor#2");
        assert_eq!(procedure_name("", 9, FunctionKind::Fallback, 2), "fallback#9");
    }

    #[test]
    fn struct_names_by_location() {
        assert_eq!(
            struct_type_name("S", 3, DataLocation::StoragePointer),
            "struct_storage_S#3"
        );
        assert_eq!(struct_type_name("S", 3, DataLocation::CallData), "struct_memory_S#3");
        assert_eq!(member_map_name("a", 4, DataLocation::Memory), "a#4#memory");
        assert_eq!(length_name("arr#7"), "arr#7#length");
    }
}
