//! Built-in functions and operators
//!
//! Every `@function` and operator element in an echo tag resolves to a
//! [`Builtin`] when it is evaluated. Arguments come off the operand stack and
//! results go back on it. Arguments are listed in push order, so the last one
//! is popped first.
//!
//! # Supported Built-ins
//!
//! | name | arguments | result |
//! |---|---|---|
//! | `+ - * /` | `a b` | `a op b` |
//! | `sin` | `x` | sine of `x` in radians, as a double |
//! | `decfmt` | `x pattern` | `x` formatted with a decimal pattern |
//! | `dup` | `x` | `x x` |
//! | `swap` | `a b` | `b a` |
//! | `setMimeType` | `type` | nothing; sets the response mime type |
//! | `paramGet`, `pparamGet`, `tparamGet` | `name default` | stored value or `default` |
//! | `pparamSet`, `tparamSet` | `value name` | nothing |
//! | `pparamDel`, `tparamDel` | `name` | nothing |
//!
//! Any other name, including the `^` operator, is "method not found".

use crate::context::Context;
use crate::interpreter::decfmt::decfmt;
use crate::interpreter::errors::RuntimeError;
use crate::memory::stack::OperandStack;
use crate::memory::value::{ArithmeticOp, Value};
use crate::parser::ast::SourceLocation;
use tracing::trace;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Builtin {
    Arithmetic(ArithmeticOp),
    Sin,
    Decfmt,
    Dup,
    Swap,
    SetMimeType,
    ParamGet,
    PParamGet,
    TParamGet,
    PParamSet,
    TParamSet,
    PParamDel,
    TParamDel,
}

impl Builtin {
    pub fn from_name(name: &str) -> Option<Self> {
        if let Some(op) = ArithmeticOp::from_symbol(name) {
            return Some(Builtin::Arithmetic(op));
        }
        let builtin = match name {
            "sin" => Builtin::Sin,
            "decfmt" => Builtin::Decfmt,
            "dup" => Builtin::Dup,
            "swap" => Builtin::Swap,
            "setMimeType" => Builtin::SetMimeType,
            "paramGet" => Builtin::ParamGet,
            "pparamGet" => Builtin::PParamGet,
            "tparamGet" => Builtin::TParamGet,
            "pparamSet" => Builtin::PParamSet,
            "tparamSet" => Builtin::TParamSet,
            "pparamDel" => Builtin::PParamDel,
            "tparamDel" => Builtin::TParamDel,
            _ => return None,
        };
        Some(builtin)
    }

    pub fn name(self) -> &'static str {
        match self {
            Builtin::Arithmetic(ArithmeticOp::Add) => "+",
            Builtin::Arithmetic(ArithmeticOp::Sub) => "-",
            Builtin::Arithmetic(ArithmeticOp::Mul) => "*",
            Builtin::Arithmetic(ArithmeticOp::Div) => "/",
            Builtin::Sin => "sin",
            Builtin::Decfmt => "decfmt",
            Builtin::Dup => "dup",
            Builtin::Swap => "swap",
            Builtin::SetMimeType => "setMimeType",
            Builtin::ParamGet => "paramGet",
            Builtin::PParamGet => "pparamGet",
            Builtin::TParamGet => "tparamGet",
            Builtin::PParamSet => "pparamSet",
            Builtin::TParamSet => "tparamSet",
            Builtin::PParamDel => "pparamDel",
            Builtin::TParamDel => "tparamDel",
        }
    }

    /// Run this built-in against `stack`, reaching `context` for output-side effects
    pub fn call<C: Context + ?Sized>(
        self,
        stack: &mut OperandStack,
        context: &mut C,
        location: SourceLocation,
    ) -> Result<(), RuntimeError> {
        let name = self.name();
        trace!(builtin = name, depth = stack.len(), "calling built-in");

        let pop = |stack: &mut OperandStack| {
            stack
                .pop(name)
                .map_err(|err| RuntimeError::from_underflow(err, location))
        };

        match self {
            Builtin::Arithmetic(op) => {
                let b = pop(stack)?;
                let a = pop(stack)?;
                let result = a
                    .arithmetic(op, &b)
                    .map_err(|err| RuntimeError::from_value(err, location))?;
                stack.push(result);
            }
            Builtin::Sin => {
                let x = pop(stack)?
                    .to_f64()
                    .map_err(|err| RuntimeError::from_value(err, location))?;
                stack.push(Value::Double(x.sin()));
            }
            Builtin::Decfmt => {
                let pattern = pop(stack)?.to_string();
                let number = pop(stack)?
                    .to_number()
                    .map_err(|err| RuntimeError::from_value(err, location))?;
                let formatted = decfmt(&pattern, number)
                    .map_err(|source| RuntimeError::InvalidFormat { source, location })?;
                stack.push(Value::Str(formatted));
            }
            Builtin::Dup => {
                let top = pop(stack)?;
                stack.push(top.clone());
                stack.push(top);
            }
            Builtin::Swap => {
                let a = pop(stack)?;
                let b = pop(stack)?;
                stack.push(a);
                stack.push(b);
            }
            Builtin::SetMimeType => {
                let mime_type = pop(stack)?.to_string();
                context.set_mime_type(&mime_type);
            }
            Builtin::ParamGet | Builtin::PParamGet | Builtin::TParamGet => {
                let default = pop(stack)?;
                let key = pop(stack)?.to_string();
                let stored = match self {
                    Builtin::ParamGet => context.parameter(&key),
                    Builtin::PParamGet => context.persistent_parameter(&key),
                    _ => context.temporary_parameter(&key),
                };
                stack.push(stored.map(Value::Str).unwrap_or(default));
            }
            Builtin::PParamSet => {
                let key = pop(stack)?.to_string();
                let value = pop(stack)?.to_string();
                context.set_persistent_parameter(&key, value);
            }
            Builtin::TParamSet => {
                let key = pop(stack)?.to_string();
                let value = pop(stack)?.to_string();
                context.set_temporary_parameter(&key, value);
            }
            Builtin::PParamDel => {
                let key = pop(stack)?.to_string();
                context.remove_persistent_parameter(&key);
            }
            Builtin::TParamDel => {
                let key = pop(stack)?.to_string();
                context.remove_temporary_parameter(&key);
            }
        }
        Ok(())
    }
}
