//! Pass trait and identifiers for optimization passes.

use std::fmt;
use std::str::FromStr;

use qmap_ir::CircuitDag;
use serde::{Deserialize, Serialize};

use crate::error::{CompileError, CompileResult};
use crate::passes::optimization::{
    CancelInverses, Cleanup, FoldSwaps, MergeRotations, PhaseGadget, RemoveIdentity,
};

/// Where in the pipeline a pass belongs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PassStage {
    /// Runs on the logical circuit before placement.
    PreRouting,
    /// Runs on the physical circuit after routing.
    PostRouting,
}

/// A semantics-preserving rewrite of a circuit DAG.
///
/// Implementations must be idempotent: running a pass on its own output
/// reports no change and leaves the DAG identical. They preserve the
/// unitary up to global phase and never add a gate.
pub trait Pass: Send + Sync {
    /// Get the name of this pass.
    fn name(&self) -> &str;

    /// Get the pipeline stage of this pass.
    fn stage(&self) -> PassStage;

    /// Rewrite the DAG in place. Returns whether anything changed.
    fn rewrite(&self, dag: &mut CircuitDag) -> CompileResult<bool>;
}

/// Identifier of a built-in optimization pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PassId {
    /// Phase-polynomial resynthesis of CX + diagonal runs.
    PhaseGadget,
    /// Drop identity gates and zero rotations.
    RemoveIdentity,
    /// Cancel adjacent inverse pairs.
    CancelInverses,
    /// Merge consecutive same-axis rotations.
    MergeRotations,
    /// Fold single-qubit gates backwards through SWAPs.
    FoldSwaps,
    /// Fixed point of the post-routing rules.
    Cleanup,
}

impl PassId {
    /// Every built-in pass, in pipeline order.
    pub const ALL: [PassId; 6] = [
        PassId::PhaseGadget,
        PassId::RemoveIdentity,
        PassId::CancelInverses,
        PassId::MergeRotations,
        PassId::FoldSwaps,
        PassId::Cleanup,
    ];

    /// Command-line name.
    pub fn name(self) -> &'static str {
        match self {
            PassId::PhaseGadget => "phase-gadget",
            PassId::RemoveIdentity => "remove-identity",
            PassId::CancelInverses => "cancel-inverses",
            PassId::MergeRotations => "merge-rotations",
            PassId::FoldSwaps => "fold-swaps",
            PassId::Cleanup => "cleanup",
        }
    }

    /// One-line description.
    pub fn description(self) -> &'static str {
        match self {
            PassId::PhaseGadget => "merge diagonal rotations on equal parities inside CX networks",
            PassId::RemoveIdentity => "drop identity gates and zero-angle rotations",
            PassId::CancelInverses => "cancel adjacent inverse gate pairs",
            PassId::MergeRotations => "sum consecutive same-axis rotations",
            PassId::FoldSwaps => "move single-qubit gates behind a SWAP when they combine there",
            PassId::Cleanup => "repeat the post-routing rules until nothing changes",
        }
    }

    /// Pipeline stage.
    pub fn stage(self) -> PassStage {
        match self {
            PassId::PhaseGadget => PassStage::PreRouting,
            _ => PassStage::PostRouting,
        }
    }

    /// Instantiate the pass.
    pub fn build(self) -> Box<dyn Pass> {
        match self {
            PassId::PhaseGadget => Box::new(PhaseGadget),
            PassId::RemoveIdentity => Box::new(RemoveIdentity),
            PassId::CancelInverses => Box::new(CancelInverses),
            PassId::MergeRotations => Box::new(MergeRotations),
            PassId::FoldSwaps => Box::new(FoldSwaps),
            PassId::Cleanup => Box::new(Cleanup),
        }
    }
}

impl fmt::Display for PassId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for PassId {
    type Err = CompileError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        PassId::ALL
            .into_iter()
            .find(|id| id.name().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| CompileError::UnknownPass(wanted.to_string()))
    }
}

/// Run one optimization pass on a DAG. Returns whether anything changed.
pub fn apply_optimization_pass(id: PassId, dag: &mut CircuitDag) -> CompileResult<bool> {
    id.build().rewrite(dag)
}

#[cfg(test)]
mod tests {
    use super::*;
    use qmap_ir::{Circuit, QubitId};

    #[test]
    fn test_pass_id_names_round_trip() {
        for id in PassId::ALL {
            assert_eq!(id.to_string().parse::<PassId>().unwrap(), id);
            assert_eq!(id.build().name(), id.name());
            assert_eq!(id.build().stage(), id.stage());
        }
    }

    #[test]
    fn test_unknown_pass() {
        let err = "sabre".parse::<PassId>().unwrap_err();
        assert!(matches!(err, CompileError::UnknownPass(name) if name == "sabre"));
    }

    #[test]
    fn test_pass_id_serde() {
        let json = serde_json::to_string(&PassId::CancelInverses).unwrap();
        assert_eq!(json, r#""cancel-inverses""#);
    }

    #[test]
    fn test_apply_optimization_pass() {
        let mut circuit = Circuit::with_size("test", 1, 0);
        circuit.h(QubitId(0)).unwrap().h(QubitId(0)).unwrap();
        let mut dag = circuit.into_dag();

        assert!(apply_optimization_pass(PassId::CancelInverses, &mut dag).unwrap());
        assert_eq!(dag.num_ops(), 0);
        assert!(!apply_optimization_pass(PassId::CancelInverses, &mut dag).unwrap());
    }
}
