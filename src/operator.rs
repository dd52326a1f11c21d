//! The operator registry: maps content-stream mnemonics to handlers and
//! enforces operand arity, honoring `BX`…`EX` compatibility sections.

use std::collections::HashMap;

use log::warn;
use smallvec::SmallVec;

use crate::errors::PdfError;
use crate::interpreter::Canvas;
use crate::object::Object;

/// Handler signature: operands arrive in stack order (bottom first).
pub type OperatorHandler = fn(&mut Canvas, Vec<Object>) -> Result<(), PdfError>;

/// How many operands an operator consumes.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum OperandCount {
    Fixed(usize),
    /// Component count of the current stroking color space (`SC`/`SCN`).
    StrokeColorComponents,
    /// Component count of the current non-stroking color space (`sc`/`scn`).
    NonStrokeColorComponents,
    /// Whatever is on the stack.
    All,
}

/// One registered operator.
pub struct CanvasOperator {
    pub mnemonic: &'static str,
    pub operands: OperandCount,
    pub handler: OperatorHandler,
}

/// The mnemonic → operator mapping used by the page interpreter.
#[derive(Default)]
pub struct OperatorRegistry {
    map: HashMap<&'static str, CanvasOperator>,
}

impl OperatorRegistry {
    pub fn new() -> Self {
        OperatorRegistry::default()
    }

    pub fn register(
        &mut self,
        mnemonic: &'static str,
        operands: OperandCount,
        handler: OperatorHandler,
    ) {
        self.map.insert(
            mnemonic,
            CanvasOperator {
                mnemonic,
                operands,
                handler,
            },
        );
    }

    pub fn get(&self, mnemonic: &str) -> Option<&CanvasOperator> {
        self.map.get(mnemonic)
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Invoke the operator named `mnemonic` with the top operands of the
    /// stack. The caller clears the stack afterwards.
    ///
    /// Unknown operators are logged and skipped, or silently swallowed
    /// inside a compatibility section. A type error thrown by a handler is
    /// suppressed inside a compatibility section.
    pub fn dispatch(
        &self,
        mnemonic: &str,
        stack: &mut SmallVec<[Object; 8]>,
        canvas: &mut Canvas,
    ) -> Result<(), PdfError> {
        let operator = match self.map.get(mnemonic) {
            Some(op) => op,
            None => {
                if !canvas.in_compatibility_section() {
                    warn!(
                        "{}",
                        PdfError::UnknownOperator {
                            mnemonic: mnemonic.to_string()
                        }
                    );
                }
                return Ok(());
            }
        };

        let arity = match operator.operands {
            OperandCount::Fixed(n) => n,
            OperandCount::StrokeColorComponents => {
                match canvas.graphics_state.stroke_color_space.components() {
                    0 => stack.len(),
                    n => n,
                }
            }
            OperandCount::NonStrokeColorComponents => {
                match canvas.graphics_state.non_stroke_color_space.components() {
                    0 => stack.len(),
                    n => n,
                }
            }
            OperandCount::All => stack.len(),
        };

        if stack.len() < arity {
            warn!(
                "operator {} expects {} operands, found {}",
                operator.mnemonic,
                arity,
                stack.len()
            );
            return Ok(());
        }

        let operands: Vec<Object> = stack.drain(stack.len() - arity..).collect();
        match (operator.handler)(canvas, operands) {
            Ok(()) => Ok(()),
            Err(PdfError::Type { .. }) if canvas.in_compatibility_section() => Ok(()),
            Err(e) => {
                warn!("operator {} skipped: {}", operator.mnemonic, e);
                Ok(())
            }
        }
    }
}
