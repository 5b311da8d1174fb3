//! Math element: a compiled expression over N float inputs.

use std::any::Any;

use log::warn;

use crate::element::{Element, ElementKind, Exec};
use crate::expr::Expr;
use crate::port::{PortKind, Ports};

/// Evaluates an arithmetic expression with variables `x0..x(N-1)` populated
/// from the input ports each tick. Unconnected variables read 0.
///
/// The expression is compiled once at construction. A parse failure is
/// logged and leaves the element emitting a constant 0.
pub struct Math {
    ports: Ports,
    output: usize,
    expr: Option<Expr>,
    vars: Vec<f32>,
}

impl Math {
    pub fn new(n_inputs: u8, expression: &str) -> Self {
        let mut ports = Ports::new();
        for i in 0..n_inputs {
            ports.add_input(format!("x{i}"), PortKind::Analog);
        }
        let output = ports.add_output("output", PortKind::Analog);

        let expr = match Expr::parse(expression, n_inputs as usize) {
            Ok(expr) => Some(expr),
            Err(err) => {
                warn!("math expression '{expression}' rejected: {err}");
                None
            }
        };

        Self {
            ports,
            output,
            expr,
            vars: vec![0.0; n_inputs as usize],
        }
    }

    /// Whether the expression compiled.
    pub fn is_valid(&self) -> bool {
        self.expr.is_some()
    }
}

impl Element for Math {
    fn kind(&self) -> ElementKind {
        ElementKind::Math
    }

    fn ports(&self) -> &Ports {
        &self.ports
    }

    fn ports_mut(&mut self) -> &mut Ports {
        &mut self.ports
    }

    fn update(&mut self, exec: &mut Exec<'_>) {
        for i in 0..self.vars.len() {
            self.vars[i] = exec.read_analog(self.ports.input(i)).unwrap_or(0.0);
        }
        if let Some(expr) = &self.expr {
            exec.write_analog(self.output, expr.eval(&self.vars));
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
