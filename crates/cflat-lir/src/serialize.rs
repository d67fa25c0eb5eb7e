//! Serializer (component 5, §4.5/§6): deterministic textual emission in
//! fixed lexicographic order. Equivalence downstream is defined as
//! whitespace-insensitive, but this emitter is itself deterministic byte for
//! byte given the same `Program`.

use crate::types::{ArithOp, BasicBlock, CmpOp, Function, Instruction, Program, Terminator, Type};

pub fn serialize_program(program: &Program) -> String {
    let mut out = String::new();

    for def in program.structs.values() {
        out += &format!("struct {} {{\n", def.name);
        for (field_name, field_ty) in &def.fields {
            out += &format!("  {field_name}: {};\n", format_type(field_ty));
        }
        out += "}\n\n";
    }

    for (name, ty) in &program.externs {
        out += &format!("extern {name} : {}\n", format_type(ty));
    }
    if !program.externs.is_empty() {
        out += "\n";
    }

    for (name, ty) in &program.funptrs {
        out += &format!("funptr {name} : {}\n", format_type(ty));
    }
    if !program.funptrs.is_empty() {
        out += "\n";
    }

    for f in program.functions.values() {
        out += &format_function(f);
        out += "\n";
    }

    out
}

fn format_function(f: &Function) -> String {
    let mut out = String::new();

    let params = f
        .params
        .iter()
        .map(|(name, ty)| format!("{name}: {}", format_type(ty)))
        .collect::<Vec<_>>()
        .join(", ");
    out += &format!("fn {}({}) -> {} {{\n", f.name, params, format_type(&f.ret));

    let locals = f
        .locals
        .iter()
        .map(|(name, ty)| format!("{name}:{}", format_type(ty)))
        .collect::<Vec<_>>()
        .join(", ");
    out += &format!("let {locals}\n\n");

    if let Some(entry_block) = f.body.get(&f.entry) {
        out += &format_block(entry_block);
    }
    for (label, block) in &f.body {
        if *label != f.entry {
            out += &format_block(block);
        }
    }

    out += "}\n";
    out
}

fn format_block(b: &BasicBlock) -> String {
    let mut out = String::new();
    out += &format!("{}:\n", b.label);
    for inst in &b.instructions {
        out += &format!("  {}\n", format_instruction(inst));
    }
    if let Some(term) = &b.terminator {
        out += &format!("  {}\n", format_terminator(term));
    }
    out += "\n";
    out
}

fn format_instruction(inst: &Instruction) -> String {
    match inst {
        Instruction::Const(lhs, n) => format!("{lhs} = $const {n}"),
        Instruction::Copy(lhs, src) => format!("{lhs} = $copy {src}"),
        Instruction::Arith(lhs, op, l, r) => format!("{lhs} = $arith {} {l} {r}", op.as_str()),
        Instruction::Cmp(lhs, op, l, r) => format!("{lhs} = $cmp {} {l} {r}", op.as_str()),
        Instruction::Load(lhs, src) => format!("{lhs} = $load {src}"),
        Instruction::Store(dst, src) => format!("$store {dst} {src}"),
        Instruction::Gfp(lhs, src, struct_id, field) => {
            format!("{lhs} = $gfp {src}, {struct_id}, {field}")
        }
        Instruction::Gep(lhs, src, idx, checked) => format!("{lhs} = $gep {src} {idx} {checked}"),
        Instruction::AllocSingle(lhs, ty) => format!("{lhs} = $alloc_single {}", format_type(ty)),
        Instruction::AllocArray(lhs, amt, ty) => {
            format!("{lhs} = $alloc_array {amt} {}", format_type(ty))
        }
        Instruction::Call(lhs, callee, args) => {
            let args_str: String = args.iter().map(|a| format!(", {a}")).collect();
            match lhs {
                Some(l) => format!("{l} = $call {callee}{args_str}"),
                None => format!("$call {callee}{args_str}"),
            }
        }
    }
}

fn format_terminator(term: &Terminator) -> String {
    match term {
        Terminator::Jump(l) => format!("$jump {l}"),
        Terminator::Branch(g, then_label, else_label) => {
            format!("$branch {g} {then_label} {else_label}")
        }
        Terminator::Ret(Some(v)) => format!("$ret {v}"),
        Terminator::Ret(None) => "$ret".to_string(),
    }
}

fn format_type(ty: &Type) -> String {
    match ty {
        Type::Int => "int".to_string(),
        Type::Nil => "nil".to_string(),
        Type::Struct(name) => format!("struct {name}"),
        Type::Array(inner) => format!("[{}]", format_type(inner)),
        Type::Ptr(inner) => format!("&{}", format_type(inner)),
        Type::Fn(params, ret) => {
            let params = params.iter().map(format_type).collect::<Vec<_>>().join(", ");
            format!("fn ({params}) -> {}", format_type(ret))
        }
    }
}
