//! Gate set understood by the placement and routing backend.
//!
//! Rotation angles are expressed in **half-turns**: `Rz(1.0)` rotates by π
//! radians, `Rz(0.5)` by π/2. Two rotations whose angles differ by a
//! multiple of two half-turns differ only by a global phase, which every
//! rewrite in this workspace is allowed to discard.

use serde::{Deserialize, Serialize};

/// Tolerance below which a normalized angle is treated as zero.
pub const ANGLE_EPSILON: f64 = 1e-9;

/// Normalize an angle in half-turns into `(-1, 1]`, snapping values within
/// [`ANGLE_EPSILON`] of zero to exactly zero.
pub fn normalize_angle(angle: f64) -> f64 {
    let mut r = angle.rem_euclid(2.0);
    if r > 1.0 {
        r -= 2.0;
    }
    if r.abs() < ANGLE_EPSILON {
        0.0
    } else {
        r
    }
}

/// Rotation axis of an `Rx`/`Ry`/`Rz` gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Axis {
    /// Bloch-sphere X axis.
    X,
    /// Bloch-sphere Y axis.
    Y,
    /// Bloch-sphere Z axis.
    Z,
}

/// A quantum gate with known semantics.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gate {
    // Single-qubit Paulis
    /// Identity gate.
    I,
    /// Pauli-X gate.
    X,
    /// Pauli-Y gate.
    Y,
    /// Pauli-Z gate.
    Z,

    // Single-qubit Cliffords and T
    /// Hadamard gate.
    H,
    /// S gate (sqrt(Z)).
    S,
    /// S-dagger gate.
    Sdg,
    /// T gate (fourth root of Z).
    T,
    /// T-dagger gate.
    Tdg,
    /// sqrt(X) gate.
    SX,
    /// sqrt(X)-dagger gate.
    SXdg,

    // Single-qubit rotations, angle in half-turns
    /// Rotation around X.
    Rx(f64),
    /// Rotation around Y.
    Ry(f64),
    /// Rotation around Z.
    Rz(f64),

    // Two-qubit gates
    /// Controlled-X: operands are (control, target).
    CX,
    /// Controlled-Z.
    CZ,
    /// SWAP.
    Swap,

    // Three-qubit gates
    /// Toffoli. Must be decomposed before routing.
    CCX,
}

impl Gate {
    /// Lower-case gate name.
    #[inline]
    pub fn name(&self) -> &'static str {
        match self {
            Gate::I => "id",
            Gate::X => "x",
            Gate::Y => "y",
            Gate::Z => "z",
            Gate::H => "h",
            Gate::S => "s",
            Gate::Sdg => "sdg",
            Gate::T => "t",
            Gate::Tdg => "tdg",
            Gate::SX => "sx",
            Gate::SXdg => "sxdg",
            Gate::Rx(_) => "rx",
            Gate::Ry(_) => "ry",
            Gate::Rz(_) => "rz",
            Gate::CX => "cx",
            Gate::CZ => "cz",
            Gate::Swap => "swap",
            Gate::CCX => "ccx",
        }
    }

    /// Number of qubit operands.
    #[inline]
    pub fn num_qubits(&self) -> u32 {
        match self {
            Gate::CX | Gate::CZ | Gate::Swap => 2,
            Gate::CCX => 3,
            _ => 1,
        }
    }

    /// Build a rotation gate around `axis`.
    pub fn rotation(axis: Axis, angle: f64) -> Self {
        match axis {
            Axis::X => Gate::Rx(angle),
            Axis::Y => Gate::Ry(angle),
            Axis::Z => Gate::Rz(angle),
        }
    }

    /// Axis and angle of an `Rx`/`Ry`/`Rz` gate.
    pub fn as_rotation(&self) -> Option<(Axis, f64)> {
        match *self {
            Gate::Rx(a) => Some((Axis::X, a)),
            Gate::Ry(a) => Some((Axis::Y, a)),
            Gate::Rz(a) => Some((Axis::Z, a)),
            _ => None,
        }
    }

    /// The inverse gate, acting on the same operands.
    pub fn inverse(&self) -> Gate {
        match *self {
            Gate::S => Gate::Sdg,
            Gate::Sdg => Gate::S,
            Gate::T => Gate::Tdg,
            Gate::Tdg => Gate::T,
            Gate::SX => Gate::SXdg,
            Gate::SXdg => Gate::SX,
            Gate::Rx(a) => Gate::Rx(-a),
            Gate::Ry(a) => Gate::Ry(-a),
            Gate::Rz(a) => Gate::Rz(-a),
            other => other,
        }
    }

    /// Whether `other` undoes `self` when applied to the same operands,
    /// up to global phase.
    pub fn cancels(&self, other: &Gate) -> bool {
        match (self.as_rotation(), other.as_rotation()) {
            (Some((a1, t1)), Some((a2, t2))) => a1 == a2 && normalize_angle(t1 + t2) == 0.0,
            (None, None) => self.inverse() == *other,
            _ => false,
        }
    }

    /// Whether the gate is diagonal in the computational basis.
    pub fn is_diagonal(&self) -> bool {
        matches!(
            self,
            Gate::I | Gate::Z | Gate::S | Gate::Sdg | Gate::T | Gate::Tdg | Gate::Rz(_) | Gate::CZ
        )
    }

    /// Whether the gate is invariant under exchanging its two operands.
    pub fn is_symmetric(&self) -> bool {
        matches!(self, Gate::CZ | Gate::Swap)
    }

    /// Angle of the `Rz` this single-qubit diagonal gate equals up to global
    /// phase.
    pub fn phase_angle(&self) -> Option<f64> {
        match *self {
            Gate::I => Some(0.0),
            Gate::Z => Some(1.0),
            Gate::S => Some(0.5),
            Gate::Sdg => Some(-0.5),
            Gate::T => Some(0.25),
            Gate::Tdg => Some(-0.25),
            Gate::Rz(a) => Some(a),
            _ => None,
        }
    }

    /// Whether the gate is the identity up to global phase.
    pub fn is_identity(&self) -> bool {
        match self.as_rotation() {
            Some((_, angle)) => normalize_angle(angle) == 0.0,
            None => matches!(self, Gate::I),
        }
    }
}
