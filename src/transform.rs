//! Transform family selection.
//!
//! The georeferencing backends fit either a global polynomial (order 1-3)
//! or a thin plate spline through the control points. The family is picked
//! once per batch run from a CLI token and applies to every row; the
//! coefficients themselves are fit per row from that row's GCPs.

use std::fmt;

/// Transform family fitted through the control points.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransformKind {
    /// Affine fit, the conservative choice for clean scans.
    Poly1,
    /// Order-2 polynomial, the batch default.
    Poly2,
    /// Order-3 polynomial, for badly distorted sheets with many GCPs.
    Poly3,
    /// Thin plate spline, interpolates every control point exactly.
    Tps,
}

impl TransformKind {
    /// Canonical token for this family.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Poly1 => "poly1",
            Self::Poly2 => "poly2",
            Self::Poly3 => "poly3",
            Self::Tps => "tps",
        }
    }
}

impl fmt::Display for TransformKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Resolved warp parameters for one transform family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransformSpec {
    pub kind: TransformKind,
    /// Polynomial order for the `poly*` kinds, `None` for TPS.
    pub order: Option<u8>,
    /// TPS passes through every control point instead of fitting a
    /// least-squares polynomial near them.
    pub exact_interpolation: bool,
}

impl TransformSpec {
    /// Resolve a transform token.
    ///
    /// Recognizes `poly1`, `poly2`, `poly3` and `tps`. Any other token
    /// falls back to `poly1` rather than failing; historical job scripts
    /// rely on that, so callers that want strict validation must check the
    /// token with [`recognizes`](Self::recognizes) first.
    #[must_use]
    pub fn resolve(token: &str) -> Self {
        match token {
            "poly2" => Self::polynomial(TransformKind::Poly2, 2),
            "poly3" => Self::polynomial(TransformKind::Poly3, 3),
            "tps" => Self {
                kind: TransformKind::Tps,
                order: None,
                exact_interpolation: true,
            },
            // "poly1" and every unknown token
            _ => Self::polynomial(TransformKind::Poly1, 1),
        }
    }

    /// Whether `token` is one of the recognized transform tokens.
    #[must_use]
    pub fn recognizes(token: &str) -> bool {
        matches!(token, "poly1" | "poly2" | "poly3" | "tps")
    }

    fn polynomial(kind: TransformKind, order: u8) -> Self {
        Self {
            kind,
            order: Some(order),
            exact_interpolation: false,
        }
    }
}
