//! High-level circuit builder API and JSON document form.

use serde::{Deserialize, Serialize};

use crate::dag::CircuitDag;
use crate::error::{IrError, IrResult};
use crate::gate::Gate;
use crate::instruction::Instruction;
use crate::qubit::{Clbit, ClbitId, Qubit, QubitId};

/// A quantum circuit over logical qubits.
///
/// Owns a [`CircuitDag`] together with register metadata. Gate helpers
/// return `&mut Self` so calls can be chained with `?`.
#[derive(Debug, Clone)]
pub struct Circuit {
    name: String,
    qubits: Vec<Qubit>,
    clbits: Vec<Clbit>,
    dag: CircuitDag,
}

impl Circuit {
    /// Create a new empty circuit.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            qubits: vec![],
            clbits: vec![],
            dag: CircuitDag::new(),
        }
    }

    /// Create a circuit with a given number of qubits and classical bits.
    pub fn with_size(name: impl Into<String>, num_qubits: u32, num_clbits: u32) -> Self {
        let mut circuit = Self::new(name);
        for _ in 0..num_qubits {
            circuit.add_qubit();
        }
        for _ in 0..num_clbits {
            circuit.add_clbit();
        }
        circuit
    }

    #[allow(clippy::cast_possible_truncation)]
    fn next_qubit_id(&self) -> QubitId {
        QubitId(self.qubits.len() as u32)
    }

    #[allow(clippy::cast_possible_truncation)]
    fn next_clbit_id(&self) -> ClbitId {
        ClbitId(self.clbits.len() as u32)
    }

    /// Add a single qubit to the circuit.
    pub fn add_qubit(&mut self) -> QubitId {
        let id = self.next_qubit_id();
        self.qubits.push(Qubit::new(id));
        self.dag.add_qubit(id);
        id
    }

    /// Add a quantum register with multiple qubits.
    pub fn add_qreg(&mut self, name: impl Into<String>, size: u32) -> Vec<QubitId> {
        let name = name.into();
        (0..size)
            .map(|i| {
                let id = self.next_qubit_id();
                self.qubits.push(Qubit::with_register(id, &name, i));
                self.dag.add_qubit(id);
                id
            })
            .collect()
    }

    /// Add a single classical bit to the circuit.
    pub fn add_clbit(&mut self) -> ClbitId {
        let id = self.next_clbit_id();
        self.push_clbit(Clbit::new(id));
        id
    }

    /// Add a classical register with multiple bits.
    pub fn add_creg(&mut self, name: impl Into<String>, size: u32) -> Vec<ClbitId> {
        let name = name.into();
        (0..size)
            .map(|i| {
                let id = self.next_clbit_id();
                self.push_clbit(Clbit::with_register(id, &name, i));
                id
            })
            .collect()
    }

    fn push_clbit(&mut self, clbit: Clbit) {
        self.dag.add_clbit(clbit.clone());
        self.clbits.push(clbit);
    }

    // =========================================================================
    // Gates
    // =========================================================================

    /// Append an arbitrary instruction.
    pub fn append(&mut self, instruction: Instruction) -> IrResult<&mut Self> {
        self.dag.apply(instruction)?;
        Ok(self)
    }

    fn single(&mut self, gate: Gate, qubit: QubitId) -> IrResult<&mut Self> {
        self.append(Instruction::single_qubit_gate(gate, qubit))
    }

    /// Apply identity gate.
    pub fn id(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.single(Gate::I, qubit)
    }

    /// Apply Hadamard gate.
    pub fn h(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.single(Gate::H, qubit)
    }

    /// Apply Pauli-X gate.
    pub fn x(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.single(Gate::X, qubit)
    }

    /// Apply Pauli-Y gate.
    pub fn y(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.single(Gate::Y, qubit)
    }

    /// Apply Pauli-Z gate.
    pub fn z(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.single(Gate::Z, qubit)
    }

    /// Apply S gate.
    pub fn s(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.single(Gate::S, qubit)
    }

    /// Apply S-dagger gate.
    pub fn sdg(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.single(Gate::Sdg, qubit)
    }

    /// Apply T gate.
    pub fn t(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.single(Gate::T, qubit)
    }

    /// Apply T-dagger gate.
    pub fn tdg(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.single(Gate::Tdg, qubit)
    }

    /// Apply sqrt(X) gate.
    pub fn sx(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.single(Gate::SX, qubit)
    }

    /// Apply sqrt(X)-dagger gate.
    pub fn sxdg(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.single(Gate::SXdg, qubit)
    }

    /// Apply Rx rotation, angle in half-turns.
    pub fn rx(&mut self, angle: f64, qubit: QubitId) -> IrResult<&mut Self> {
        self.single(Gate::Rx(angle), qubit)
    }

    /// Apply Ry rotation, angle in half-turns.
    pub fn ry(&mut self, angle: f64, qubit: QubitId) -> IrResult<&mut Self> {
        self.single(Gate::Ry(angle), qubit)
    }

    /// Apply Rz rotation, angle in half-turns.
    pub fn rz(&mut self, angle: f64, qubit: QubitId) -> IrResult<&mut Self> {
        self.single(Gate::Rz(angle), qubit)
    }

    /// Apply CNOT gate.
    pub fn cx(&mut self, control: QubitId, target: QubitId) -> IrResult<&mut Self> {
        self.append(Instruction::two_qubit_gate(Gate::CX, control, target))
    }

    /// Apply CZ gate.
    pub fn cz(&mut self, q1: QubitId, q2: QubitId) -> IrResult<&mut Self> {
        self.append(Instruction::two_qubit_gate(Gate::CZ, q1, q2))
    }

    /// Apply SWAP gate.
    pub fn swap(&mut self, q1: QubitId, q2: QubitId) -> IrResult<&mut Self> {
        self.append(Instruction::two_qubit_gate(Gate::Swap, q1, q2))
    }

    /// Apply Toffoli gate.
    pub fn ccx(&mut self, c1: QubitId, c2: QubitId, target: QubitId) -> IrResult<&mut Self> {
        self.append(Instruction::gate(Gate::CCX, [c1, c2, target]))
    }

    // =========================================================================
    // Non-unitary operations
    // =========================================================================

    /// Measure a qubit into a classical bit.
    pub fn measure(&mut self, qubit: QubitId, clbit: ClbitId) -> IrResult<&mut Self> {
        self.append(Instruction::measure(qubit, clbit))
    }

    /// Measure qubit `i` into classical bit `i` for every qubit, adding
    /// classical bits as needed.
    pub fn measure_all(&mut self) -> IrResult<&mut Self> {
        while self.clbits.len() < self.qubits.len() {
            self.add_clbit();
        }
        let pairs: Vec<_> = self
            .qubits
            .iter()
            .zip(&self.clbits)
            .map(|(q, c)| (q.id, c.id))
            .collect();
        for (qubit, clbit) in pairs {
            self.measure(qubit, clbit)?;
        }
        Ok(self)
    }

    /// Apply a barrier to specified qubits.
    pub fn barrier(&mut self, qubits: impl IntoIterator<Item = QubitId>) -> IrResult<&mut Self> {
        self.append(Instruction::barrier(qubits))
    }

    /// Apply a barrier to all qubits.
    pub fn barrier_all(&mut self) -> IrResult<&mut Self> {
        let qubits: Vec<_> = self.qubits.iter().map(|q| q.id).collect();
        self.barrier(qubits)
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Get the circuit name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the number of qubits.
    pub fn num_qubits(&self) -> usize {
        self.qubits.len()
    }

    /// Get the number of classical bits.
    pub fn num_clbits(&self) -> usize {
        self.clbits.len()
    }

    /// Get the circuit depth.
    pub fn depth(&self) -> usize {
        self.dag.depth()
    }

    /// Get the qubits in the circuit.
    pub fn qubits(&self) -> &[Qubit] {
        &self.qubits
    }

    /// Get the classical bits in the circuit.
    pub fn clbits(&self) -> &[Clbit] {
        &self.clbits
    }

    /// Get a reference to the underlying DAG.
    pub fn dag(&self) -> &CircuitDag {
        &self.dag
    }

    /// Consume the circuit and return the DAG.
    pub fn into_dag(self) -> CircuitDag {
        self.dag
    }

    /// Wrap an existing DAG. Qubit wires are taken as unnamed; classical
    /// register slots are kept.
    pub fn from_dag(name: impl Into<String>, dag: CircuitDag) -> Self {
        let qubits = dag.qubits().map(Qubit::new).collect();
        let clbits = dag
            .clbits()
            .filter_map(|c| dag.clbit_info(c).cloned())
            .collect();
        Self {
            name: name.into(),
            qubits,
            clbits,
            dag,
        }
    }

    // =========================================================================
    // Documents
    // =========================================================================

    /// Snapshot of this circuit as a serializable document.
    pub fn to_document(&self) -> CircuitDocument {
        let num_qubits = self.qubits.iter().map(|q| q.id.0 + 1).max().unwrap_or(0);
        CircuitDocument {
            name: self.name.clone(),
            num_qubits,
            clbits: self.clbits.clone(),
            instructions: self.dag.instructions(),
        }
    }

    /// Build a circuit from a document, validating every instruction.
    pub fn from_document(doc: CircuitDocument) -> IrResult<Self> {
        let mut circuit = Self::with_size(doc.name, doc.num_qubits, 0);

        let mut expected = 0u32;
        for clbit in doc.clbits {
            if clbit.id.0 != expected {
                return Err(IrError::InvalidDocument(format!(
                    "classical bits must be numbered densely from 0, found {} at slot {expected}",
                    clbit.id
                )));
            }
            expected += 1;
            circuit.push_clbit(clbit);
        }

        for inst in doc.instructions {
            circuit.append(inst)?;
        }
        Ok(circuit)
    }

    /// Serialize to pretty-printed JSON.
    pub fn to_json(&self) -> IrResult<String> {
        serde_json::to_string_pretty(&self.to_document())
            .map_err(|e| IrError::InvalidDocument(e.to_string()))
    }

    /// Parse a JSON circuit document.
    pub fn from_json(json: &str) -> IrResult<Self> {
        let doc: CircuitDocument =
            serde_json::from_str(json).map_err(|e| IrError::InvalidDocument(e.to_string()))?;
        Self::from_document(doc)
    }

    // =========================================================================
    // Pre-built circuits
    // =========================================================================

    /// Create a Bell state circuit.
    pub fn bell() -> IrResult<Self> {
        let mut circuit = Self::with_size("bell", 2, 2);
        circuit
            .h(QubitId(0))?
            .cx(QubitId(0), QubitId(1))?
            .measure(QubitId(0), ClbitId(0))?
            .measure(QubitId(1), ClbitId(1))?;
        Ok(circuit)
    }

    /// Create an `n`-qubit GHZ circuit with a CNOT chain and final
    /// measurements.
    pub fn ghz(n: u32) -> IrResult<Self> {
        if n == 0 {
            return Ok(Self::new("ghz_0"));
        }

        let mut circuit = Self::with_size("ghz", n, n);
        circuit.h(QubitId(0))?;
        for i in 0..n - 1 {
            circuit.cx(QubitId(i), QubitId(i + 1))?;
        }
        for i in 0..n {
            circuit.measure(QubitId(i), ClbitId(i))?;
        }
        Ok(circuit)
    }
}

/// Serializable form of a [`Circuit`].
///
/// ```json
/// {
///   "name": "bell",
///   "num_qubits": 2,
///   "clbits": [{"id": 0}, {"id": 1}],
///   "instructions": [
///     {"kind": {"gate": "h"}, "qubits": [0]},
///     {"kind": {"gate": "cx"}, "qubits": [0, 1]},
///     {"kind": "measure", "qubits": [0], "clbits": [0]}
///   ]
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CircuitDocument {
    /// Circuit name.
    #[serde(default)]
    pub name: String,
    /// Number of qubits; wires are `0..num_qubits`.
    pub num_qubits: u32,
    /// Classical bits, numbered densely from 0.
    #[serde(default)]
    pub clbits: Vec<Clbit>,
    /// Instructions in program order.
    #[serde(default)]
    pub instructions: Vec<Instruction>,
}
