//! Multiplexer over typed signal sets with a boolean selector.

use std::any::Any;

use crate::element::{Element, ElementKind, Exec};
use crate::elements::Scalar;
use crate::port::{PortKind, Ports};

/// Selects one of `n_sets` signal sets of `width` ports each. The selector
/// is always boolean regardless of the signal type; in this core only the
/// binary choice `select as usize` is used.
pub struct Mux<T: Scalar> {
    ports: Ports,
    width: usize,
    n_sets: usize,
    _marker: std::marker::PhantomData<T>,
}

impl<T: Scalar> Mux<T> {
    /// `width` signal ports per set, `n_sets` input sets (typically 2).
    pub fn new(width: u8, n_sets: u8) -> Self {
        let width = width.max(1) as usize;
        let n_sets = n_sets.max(2) as usize;

        let mut ports = Ports::new();
        ports.add_input("select", PortKind::Digital);
        for set in 0..n_sets {
            for sig in 0..width {
                ports.add_input(format!("input_{set}_{sig}"), T::KIND);
            }
        }
        for sig in 0..width {
            ports.add_output(format!("output_{sig}"), T::KIND);
        }

        Self {
            ports,
            width,
            n_sets,
            _marker: std::marker::PhantomData,
        }
    }

    /// Input port index of signal `sig` in set `set` (selector is port 0).
    fn signal_input(&self, set: usize, sig: usize) -> usize {
        1 + set * self.width + sig
    }
}

impl<T: Scalar> Element for Mux<T> {
    fn kind(&self) -> ElementKind {
        T::MUX_KIND
    }

    fn ports(&self) -> &Ports {
        &self.ports
    }

    fn ports_mut(&mut self) -> &mut Ports {
        &mut self.ports
    }

    fn update(&mut self, exec: &mut Exec<'_>) {
        let select = exec
            .read_digital(self.ports.input(0))
            .unwrap_or(false);
        let set = (select as usize).min(self.n_sets - 1);

        for sig in 0..self.width {
            let input = self.ports.input(self.signal_input(set, sig));
            let value = exec
                .read(input)
                .and_then(T::from_value)
                .unwrap_or_default();
            exec.write(sig, value.into_value());
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
