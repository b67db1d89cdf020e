//! Message routing: the body of `recv_internal`.
//!
//! Dispatch is a fixed cascade:
//!
//! ```text
//! bounced ─▶ bounce receiver, or ignore
//! op == prefix(T) ─▶ typed receivers, declaration order
//! op == 0, ≤ 32 bits ─▶ empty receiver
//! op == 0 ─▶ text receivers by body hash
//! anything else ─▶ fallback receiver, or throw(130)
//! ```
//!
//! Every handled branch loads the contract state, runs the receiver and
//! stores the state back before returning.

use tact_ir::{ReceiverSelector, TypeDescription, TypeGraph, TypeRef};

use crate::allocation::Allocations;
use crate::cell_hash::comment_hash;
use crate::context::WriterContext;
use crate::error::CodegenResult;
use crate::function::receiver_name;
use crate::serialization::reader_name;
use crate::stdlib::{exit_code, CONTEXT, CONTEXT_SENDER, VERIFY_ADDRESS};
use crate::storage::{load_name, store_name};
use crate::tensor::{RenderMode, Tensor};

/// A text receiver with its precomputed body hash.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommentReceiver {
    pub comment: String,
    pub hash: String,
}

/// Hash every distinct text receiver of `contract`, in declaration order.
pub fn comment_receivers(contract: &TypeDescription) -> CodegenResult<Vec<CommentReceiver>> {
    let mut out: Vec<CommentReceiver> = Vec::new();
    for receiver in &contract.receivers {
        if let ReceiverSelector::InternalComment { comment } = &receiver.selector {
            if out.iter().any(|c| &c.comment == comment) {
                continue;
            }
            out.push(CommentReceiver {
                comment: comment.clone(),
                hash: comment_hash(comment)?,
            });
        }
    }
    Ok(out)
}

/// Hash of text receiver `comment`, looked up in precomputed `comments`.
pub fn hash_of<'c>(comments: &'c [CommentReceiver], comment: &str) -> &'c str {
    match comments.iter().find(|c| c.comment == comment) {
        Some(c) => &c.hash,
        None => panic!("text receiver \"{comment}\" was not hashed"),
    }
}

/// Loads state, runs one receiver and persists state.
struct Dispatch {
    contract: String,
    state: Tensor,
}

impl Dispatch {
    fn write(&self, receiver: &str, args: &str, ctx: &mut WriterContext) {
        let load = ctx.used(&load_name(&self.contract));
        let store = ctx.used(&store_name(&self.contract));
        let target = ctx.used(receiver);
        let names = self.state.render(RenderMode::Names);
        ctx.append(self.state.bind(&format!("{load}()")));
        ctx.append(format!("{names}~{target}({args});"));
        ctx.append(format!("{store}({names});"));
        ctx.append("return ();");
    }
}

/// Emit `recv_internal` for `contract`.
///
/// # Panics
///
/// Panics if a typed receiver's payload has no message prefix.
pub fn write_router(
    contract: &TypeDescription,
    comments: &[CommentReceiver],
    allocations: &Allocations,
    graph: &TypeGraph,
    ctx: &mut WriterContext,
) {
    let name = &contract.name;
    let dispatch = Dispatch {
        contract: name.clone(),
        state: Tensor::of_type(&TypeRef::simple(name.clone()), graph, "self"),
    };

    ctx.append("() recv_internal(int msg_value, cell in_msg_cell, slice in_msg) impure {");
    ctx.in_indent(|ctx| {
        let verify = ctx.used(VERIFY_ADDRESS);
        let context = ctx.used(CONTEXT);
        let sender = ctx.used(CONTEXT_SENDER);
        ctx.append("");
        ctx.append(";; Context");
        ctx.append("var cs = in_msg_cell.begin_parse();");
        ctx.append("var msg_flags = cs~load_uint(4);");
        ctx.append("var msg_bounced = ((msg_flags & 1) == 1 ? true : false);");
        ctx.append(format!("slice msg_sender_addr = {verify}(cs~load_msg_addr());"));
        ctx.append(format!(
            "{context} = (msg_bounced, msg_sender_addr, msg_value, cs);"
        ));
        ctx.append(format!("{sender} = msg_sender_addr;"));

        ctx.append("");
        ctx.append(";; Handle bounced messages");
        ctx.append("if (msg_bounced) {");
        ctx.in_indent(|ctx| {
            let bounce = contract
                .receivers
                .iter()
                .find(|r| matches!(r.selector, ReceiverSelector::InternalBounce { .. }));
            match bounce {
                Some(r) => {
                    ctx.append("in_msg~skip_bits(32);");
                    dispatch.write(&receiver_name(name, &r.selector, None), "in_msg", ctx);
                }
                None => ctx.append("return ();"),
            }
        });
        ctx.append("}");

        ctx.append("");
        ctx.append(";; Parse incoming message");
        ctx.append("int op = 0;");
        ctx.append("if (slice_bits(in_msg) >= 32) {");
        ctx.in_indent(|ctx| ctx.append("op = in_msg.preload_uint(32);"));
        ctx.append("}");

        for receiver in &contract.receivers {
            let ReceiverSelector::InternalBinary { type_name, .. } = &receiver.selector else {
                continue;
            };
            let Some(prefix) = allocations.get(type_name).prefix else {
                panic!("invalid allocation: `{type_name}` has no message prefix");
            };
            let message = Tensor::of_type(&TypeRef::simple(type_name.clone()), graph, "msg");
            ctx.append("");
            ctx.append(format!(";; Receive {type_name} message"));
            ctx.append(format!("if (op == {prefix}) {{"));
            ctx.in_indent(|ctx| {
                let reader = ctx.used(&reader_name(type_name));
                ctx.append(message.bind(&format!("in_msg~{reader}()")));
                let target = receiver_name(name, &receiver.selector, None);
                dispatch.write(&target, &message.render(RenderMode::Names), ctx);
            });
            ctx.append("}");
        }

        if let Some(receiver) = contract
            .receivers
            .iter()
            .find(|r| r.selector == ReceiverSelector::InternalEmpty)
        {
            ctx.append("");
            ctx.append(";; Receive empty message");
            ctx.append("if ((op == 0) & (slice_bits(in_msg) <= 32)) {");
            ctx.in_indent(|ctx| {
                dispatch.write(&receiver_name(name, &receiver.selector, None), "", ctx);
            });
            ctx.append("}");
        }

        if !comments.is_empty() {
            ctx.append("");
            ctx.append(";; Text Receivers");
            ctx.append("if (op == 0) {");
            ctx.in_indent(|ctx| {
                ctx.append("var text_op = slice_hash(in_msg);");
                for comment in comments {
                    let selector = ReceiverSelector::InternalComment {
                        comment: comment.comment.clone(),
                    };
                    ctx.append("");
                    // Escaped, so the text cannot end the comment line.
                    ctx.append(format!(";; Receive {:?} message", comment.comment));
                    ctx.append(format!("if (text_op == 0x{}) {{", comment.hash));
                    ctx.in_indent(|ctx| {
                        let target = receiver_name(name, &selector, Some(&comment.hash));
                        dispatch.write(&target, "", ctx);
                    });
                    ctx.append("}");
                }
            });
            ctx.append("}");
        }

        let fallback = contract
            .receivers
            .iter()
            .find(|r| matches!(r.selector, ReceiverSelector::InternalFallback { .. }));
        ctx.append("");
        match fallback {
            Some(r) => {
                ctx.append(";; Receiver fallback");
                dispatch.write(&receiver_name(name, &r.selector, None), "in_msg", ctx);
            }
            None => {
                ctx.append(";; Invalid message");
                ctx.append(format!("throw({});", exit_code::INVALID_MESSAGE));
            }
        }
    });
    ctx.append("}");
}
