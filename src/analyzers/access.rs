use quote::ToTokens;
use std::collections::HashSet;
use syn::visit::{self, Visit};
use syn::{Block, Expr, Member, Pat, Type};

use crate::config::ResultProtocol;

/// The member name an expression reads, for both field access and
/// zero-argument method call forms.
pub fn member_name(expr: &Expr) -> Option<String> {
    match expr {
        Expr::Field(field) => match &field.member {
            Member::Named(ident) => Some(ident.to_string()),
            Member::Unnamed(_) => None,
        },
        Expr::MethodCall(call) if call.args.is_empty() => Some(call.method.to_string()),
        _ => None,
    }
}

/// The receiver a member access is performed on.
pub fn receiver(expr: &Expr) -> Option<&Expr> {
    match expr {
        Expr::Field(field) => Some(&field.base),
        Expr::MethodCall(call) => Some(&call.receiver),
        _ => None,
    }
}

pub fn receiver_text(expr: &Expr) -> Option<String> {
    receiver(expr).map(|base| base.to_token_stream().to_string())
}

struct ValueAccessCollector<'a, 'ast> {
    protocol: &'a ResultProtocol,
    accesses: Vec<&'ast Expr>,
}

impl<'ast> Visit<'ast> for ValueAccessCollector<'_, 'ast> {
    fn visit_expr(&mut self, expr: &'ast Expr) {
        if member_name(expr).is_some_and(|name| name == self.protocol.value_accessor) {
            self.accesses.push(expr);
        }
        visit::visit_expr(self, expr);
    }

    // Nested items are separate bodies with their own analyses.
    fn visit_item(&mut self, _item: &'ast syn::Item) {}
}

/// All value-accessor expressions inside one function body, in document
/// order. The returned references double as walk targets: the walker
/// compares nodes by identity within the same tree.
pub fn collect_value_accesses<'ast>(
    block: &'ast Block,
    protocol: &ResultProtocol,
) -> Vec<&'ast Expr> {
    let mut collector = ValueAccessCollector {
        protocol,
        accesses: Vec::new(),
    };
    collector.visit_block(block);
    collector.accesses
}

/// Receiver expressions in one file that look like wrapper values: they
/// appear as the receiver of a flag member, are matched against a flag
/// pattern, or are bound with a type named in `wrapper_types`.
///
/// Stands in for the receiver's semantic type, which a purely syntactic
/// analysis cannot see. Receivers are compared by source text.
pub struct ReceiverIndex {
    wrappers: HashSet<String>,
}

impl ReceiverIndex {
    pub fn build(file: &syn::File, protocol: &ResultProtocol) -> Self {
        let mut collector = ReceiverCollector {
            protocol,
            wrappers: HashSet::new(),
        };
        collector.visit_file(file);
        Self {
            wrappers: collector.wrappers,
        }
    }

    pub fn is_wrapper_receiver(&self, access: &Expr) -> bool {
        receiver_text(access).is_some_and(|text| self.wrappers.contains(&text))
    }
}

struct ReceiverCollector<'a> {
    protocol: &'a ResultProtocol,
    wrappers: HashSet<String>,
}

impl<'ast> Visit<'ast> for ReceiverCollector<'_> {
    fn visit_expr(&mut self, expr: &'ast Expr) {
        if member_name(expr)
            .is_some_and(|name| name == self.protocol.success_flag || name == self.protocol.failure_flag)
        {
            if let Some(text) = receiver_text(expr) {
                self.wrappers.insert(text);
            }
        }
        match expr {
            Expr::Match(expr_match) => {
                if expr_match
                    .arms
                    .iter()
                    .any(|arm| mentions_flag(&arm.pat, self.protocol))
                {
                    self.wrappers
                        .insert(expr_match.expr.to_token_stream().to_string());
                }
            }
            Expr::Let(expr_let) => {
                if mentions_flag(&expr_let.pat, self.protocol) {
                    self.wrappers
                        .insert(expr_let.expr.to_token_stream().to_string());
                }
            }
            _ => {}
        }
        visit::visit_expr(self, expr);
    }

    // Covers both typed fn parameters and annotated let bindings.
    fn visit_pat_type(&mut self, pat_type: &'ast syn::PatType) {
        if let Pat::Ident(pat_ident) = &*pat_type.pat {
            if is_hinted_type(&pat_type.ty, self.protocol) {
                self.wrappers.insert(pat_ident.ident.to_string());
            }
        }
        visit::visit_pat_type(self, pat_type);
    }
}

/// A struct pattern naming either flag marks its scrutinee as a wrapper.
fn mentions_flag(pat: &Pat, protocol: &ResultProtocol) -> bool {
    let Pat::Struct(pat_struct) = pat else {
        return false;
    };
    pat_struct.fields.iter().any(|field| match &field.member {
        Member::Named(name) => {
            let name = name.to_string();
            name == protocol.success_flag || name == protocol.failure_flag
        }
        Member::Unnamed(_) => false,
    })
}

fn is_hinted_type(ty: &Type, protocol: &ResultProtocol) -> bool {
    match ty {
        Type::Reference(reference) => is_hinted_type(&reference.elem, protocol),
        Type::Path(type_path) => type_path.path.segments.last().is_some_and(|segment| {
            protocol
                .wrapper_types
                .iter()
                .any(|hint| segment.ident == hint)
        }),
        _ => false,
    }
}

/// First value access inside an expression, if any.
pub fn find_value_access<'ast>(expr: &'ast Expr, protocol: &ResultProtocol) -> Option<&'ast Expr> {
    let mut collector = ValueAccessCollector {
        protocol,
        accesses: Vec::new(),
    };
    collector.visit_expr(expr);
    collector.accesses.into_iter().next()
}
