//! Tangent and primal wrappers consumed by the differentiation rules.

/// A forward-mode perturbation, or a cotangent flowing backwards.
///
/// `Zero` is the symbolic zero: rules short-circuit on it instead of materializing zeros.
#[derive(Clone, Debug, PartialEq)]
pub enum Tangent<X> {
    Zero,
    Value(X),
}

impl<X> Tangent<X> {
    pub fn is_zero(&self) -> bool {
        matches!(self, Tangent::Zero)
    }

    pub fn value(self) -> Option<X> {
        match self {
            Tangent::Zero => None,
            Tangent::Value(x) => Some(x),
        }
    }
}

/// A value input of a reverse-mode rule: either a known primal, or the linear input whose
/// cotangent is being requested.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Primal<X> {
    Known(X),
    Linear,
}

impl<X> Primal<X> {
    pub fn is_linear(&self) -> bool {
        matches!(self, Primal::Linear)
    }
}

/// Result of a reverse-mode rule of a bilinear primitive: the cotangent of whichever value
/// input was linear.
#[derive(Clone, Debug, PartialEq)]
pub enum Cotangent<T, O> {
    /// Cotangent for the stored values, one per specified entry.
    Data(Vec<T>),
    /// Cotangent for the dense operand.
    Operand(O),
}

/// Sum two tangents, keeping symbolic zeros symbolic.
pub fn add_tangents<X>(a: Tangent<X>, b: Tangent<X>, add: impl FnOnce(X, X) -> X) -> Tangent<X> {
    match (a, b) {
        (Tangent::Zero, t) | (t, Tangent::Zero) => t,
        (Tangent::Value(x), Tangent::Value(y)) => Tangent::Value(add(x, y)),
    }
}
