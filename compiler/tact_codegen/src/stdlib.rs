//! Support functions shared by generated code.
//!
//! Everything here is registered as support code: it costs nothing unless
//! generated code marks it used. `stdlib.fc` itself is included verbatim by
//! the rendered program and is not part of this crate.

use crate::context::{Flag, WriterContext};

/// Message context: `(bounced, sender, value, raw body)`.
pub const CONTEXT: &str = "__tact_context";
pub const CONTEXT_SENDER: &str = "__tact_context_sender";
/// System cell holding the code dictionary of deployable contracts.
pub const CONTEXT_SYS: &str = "__tact_context_sys";

pub const VERIFY_ADDRESS: &str = "__tact_verify_address";
pub const LOAD_ADDRESS: &str = "__tact_load_address";
pub const STORE_ADDRESS: &str = "__tact_store_address";
pub const NOT_NULL: &str = "__tact_not_null";
pub const DICT_GET_CODE: &str = "__tact_dict_get_code";
pub const DICT_SET_CODE: &str = "__tact_dict_set_code";

/// Largest tuple `TUPLE`/`UNTUPLE` take as an immediate; wider tuples pass
/// their size on the stack.
const MAX_IMMEDIATE_TUPLE: usize = 15;

/// Largest tuple the machine can build.
pub const MAX_TUPLE_SIZE: usize = 255;

/// Exit codes thrown by generated code.
pub mod exit_code {
    pub const NULL_REFERENCE: u32 = 128;
    pub const INVALID_PREFIX: u32 = 129;
    pub const INVALID_MESSAGE: u32 = 130;
    pub const CODE_NOT_FOUND: u32 = 135;
    pub const INVALID_ADDRESS: u32 = 136;
    pub const MASTERCHAIN_NOT_ENABLED: u32 = 137;
}

pub fn write_stdlib(ctx: &mut WriterContext) {
    ctx.fun(CONTEXT, |ctx| ctx.global("(int, slice, int, slice)"));
    ctx.fun(CONTEXT_SENDER, |ctx| ctx.global("slice"));
    ctx.fun(CONTEXT_SYS, |ctx| ctx.global("cell"));

    ctx.fun(VERIFY_ADDRESS, |ctx| {
        ctx.signature(format!("slice {VERIFY_ADDRESS}(slice address)"));
        ctx.flag(Flag::Inline);
        ctx.body(|ctx| {
            ctx.append(format!(
                "throw_unless({}, address.slice_bits() == 267);",
                exit_code::INVALID_ADDRESS
            ));
            ctx.append("return address;");
        });
    });

    ctx.fun(LOAD_ADDRESS, |ctx| {
        ctx.signature(format!("(slice, slice) {LOAD_ADDRESS}(slice cs)"));
        ctx.flag(Flag::Inline);
        ctx.body(|ctx| {
            let verify = ctx.used(VERIFY_ADDRESS);
            ctx.append("slice raw = cs~load_msg_addr();");
            ctx.append(format!("return (cs, {verify}(raw));"));
        });
    });

    ctx.fun(STORE_ADDRESS, |ctx| {
        ctx.signature(format!("builder {STORE_ADDRESS}(builder b, slice address)"));
        ctx.flag(Flag::Inline);
        ctx.body(|ctx| {
            let verify = ctx.used(VERIFY_ADDRESS);
            ctx.append(format!("return b.store_slice({verify}(address));"));
        });
    });

    ctx.fun(NOT_NULL, |ctx| {
        ctx.signature(format!("forall X -> X {NOT_NULL}(X x)"));
        ctx.flag(Flag::Inline);
        ctx.body(|ctx| {
            ctx.append(format!(
                "throw_if({}, null?(x));",
                exit_code::NULL_REFERENCE
            ));
            ctx.append("return x;");
        });
    });

    ctx.fun(DICT_GET_CODE, |ctx| {
        ctx.signature(format!("cell {DICT_GET_CODE}(cell dict, int id)"));
        ctx.flag(Flag::Inline);
        ctx.body(|ctx| {
            ctx.append("var (data, ok) = udict_get_ref?(dict, 16, id);");
            ctx.append(format!("throw_unless({}, ok);", exit_code::CODE_NOT_FOUND));
            ctx.append("return data;");
        });
    });

    ctx.fun(DICT_SET_CODE, |ctx| {
        ctx.signature(format!("cell {DICT_SET_CODE}(cell dict, int id, cell code)"));
        ctx.flag(Flag::Inline);
        ctx.body(|ctx| ctx.append("return udict_set_ref(dict, 16, id, code);"));
    });

}

/// Declare the `n`-element tuple constructor on demand and return its name.
///
/// # Panics
///
/// Panics if `n` exceeds [`MAX_TUPLE_SIZE`].
pub fn tuple_create(ctx: &mut WriterContext, n: usize) -> String {
    assert!(n <= MAX_TUPLE_SIZE, "tuple of {n} values exceeds {MAX_TUPLE_SIZE}");
    let name = format!("__tact_tuple_create_{n}");
    ctx.fun(&name, |ctx| {
        let vars = type_vars(n);
        ctx.signature(format!("forall {vars} -> tuple {name}(({vars}) v)"));
        if n <= MAX_IMMEDIATE_TUPLE {
            ctx.asm(format!("{n} TUPLE"));
        } else {
            ctx.asm(format!("{n} PUSHINT TUPLEVAR"));
        }
    });
    ctx.used(&name)
}

/// Declare the `n`-element tuple destructor on demand and return its name.
pub fn tuple_destroy(ctx: &mut WriterContext, n: usize) -> String {
    assert!(n <= MAX_TUPLE_SIZE, "tuple of {n} values exceeds {MAX_TUPLE_SIZE}");
    let name = format!("__tact_tuple_destroy_{n}");
    ctx.fun(&name, |ctx| {
        let vars = type_vars(n);
        ctx.signature(format!("forall {vars} -> ({vars}) {name}(tuple v)"));
        if n <= MAX_IMMEDIATE_TUPLE {
            ctx.asm(format!("{n} UNTUPLE"));
        } else {
            ctx.asm(format!("{n} PUSHINT UNTUPLEVAR"));
        }
    });
    ctx.used(&name)
}

fn type_vars(n: usize) -> String {
    (0..n).map(|i| format!("X{i}")).collect::<Vec<_>>().join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn address_helpers_pull_in_verification() {
        let mut ctx = WriterContext::new();
        write_stdlib(&mut ctx);
        ctx.used(LOAD_ADDRESS);
        let out = ctx.render(false);
        assert!(out.contains("(slice, slice) __tact_load_address(slice cs) inline {"));
        assert!(out.contains("throw_unless(136, address.slice_bits() == 267);"));
        assert!(!out.contains("__tact_store_address"));
        assert!(!out.contains("global"));
    }

    #[test]
    fn tuple_helpers_are_asm() {
        let mut ctx = WriterContext::new();
        assert_eq!(tuple_create(&mut ctx, 2), "__tact_tuple_create_2");
        assert_eq!(tuple_destroy(&mut ctx, 2), "__tact_tuple_destroy_2");
        // Second declaration is a no-op.
        tuple_create(&mut ctx, 2);
        let out = ctx.render(false);
        assert!(out.contains(
            "forall X0, X1 -> tuple __tact_tuple_create_2((X0, X1) v) asm \"2 TUPLE\";"
        ));
        assert!(out.contains(
            "forall X0, X1 -> (X0, X1) __tact_tuple_destroy_2(tuple v) asm \"2 UNTUPLE\";"
        ));
    }

    #[test]
    fn nothing_is_rendered_unless_used() {
        let mut ctx = WriterContext::new();
        write_stdlib(&mut ctx);
        assert_eq!(
            ctx.render(false),
            "#pragma version >=0.4.0;\n#include \"stdlib.fc\";\n"
        );
    }

    #[test]
    fn context_is_only_globals() {
        let mut ctx = WriterContext::new();
        write_stdlib(&mut ctx);
        for name in [CONTEXT, CONTEXT_SENDER, CONTEXT_SYS] {
            assert!(ctx.is_declared(name), "{name} is not declared");
        }
        assert!(!ctx.is_declared("__tact_context_get"));
    }

    #[test]
    fn wide_tuples_pass_their_size() {
        let mut ctx = WriterContext::new();
        tuple_create(&mut ctx, 15);
        tuple_create(&mut ctx, 16);
        tuple_destroy(&mut ctx, 16);
        let out = ctx.render(false);
        assert!(out.contains("__tact_tuple_create_15((X0, X1, X2, X3, X4, X5, X6, X7, X8, X9, X10, X11, X12, X13, X14) v) asm \"15 TUPLE\";"));
        assert!(out.contains("__tact_tuple_create_16((X0, X1, X2, X3, X4, X5, X6, X7, X8, X9, X10, X11, X12, X13, X14, X15) v) asm \"16 PUSHINT TUPLEVAR\";"));
        assert!(out.contains("__tact_tuple_destroy_16(tuple v) asm \"16 PUSHINT UNTUPLEVAR\";"));
    }

    #[test]
    #[should_panic(expected = "tuple of 256 values exceeds 255")]
    fn oversized_tuples_panic() {
        let mut ctx = WriterContext::new();
        tuple_create(&mut ctx, 256);
    }
}
