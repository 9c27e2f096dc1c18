//! The SAPI `qp` problem and answer encoding.
//!
//! # Problem
//!
//! | Field | Content |
//! |-------|---------|
//! | `lin` | little-endian `f64` per qubit `0..num_qubits`, `NaN` for qubits the problem does not use |
//! | `quad` | little-endian `f64` per active coupler whose qubits are both used, in the solver's coupler order |
//!
//! # Answer
//!
//! | Field | Content |
//! |-------|---------|
//! | `active_variables` | little-endian `i32` qubit indices |
//! | `energies` | little-endian `f64` per row |
//! | `num_occurrences` | little-endian `i32` per row; absent means 1 |
//! | `solutions` | one row per sample, one bit per active variable, MSB first, rows padded to whole bytes; bit 1 is spin +1 |
//!
//! All binary fields are base64 encoded.

use std::collections::BTreeMap;

use base64::{Engine, engine::general_purpose::STANDARD as BASE64};
use revanneal_hal::SolverProperties;
use revanneal_ir::{AnswerMode, IsingModel, NodeId, SampleRecord, SampleSet, SpinAssignment, Timing};
use serde::{Deserialize, Serialize};

use crate::error::{DWaveError, DWaveResult};

/// Encoded problem data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QpProblem {
    /// Always `"qp"`.
    pub format: String,
    /// Base64 linear biases.
    pub lin: String,
    /// Base64 quadratic couplings.
    pub quad: String,
}

/// Encoded answer data.
#[derive(Debug, Clone, Deserialize)]
pub struct QpAnswer {
    /// Always `"qp"`.
    pub format: String,
    /// Total qubits of the solver.
    #[serde(default)]
    pub num_variables: Option<u32>,
    /// Base64 `i32` qubit indices.
    pub active_variables: String,
    /// Base64 `f64` energies.
    pub energies: String,
    /// Base64 `i32` occurrence counts.
    #[serde(default)]
    pub num_occurrences: Option<String>,
    /// Base64 packed solutions.
    pub solutions: String,
    /// Timing breakdown, µs.
    #[serde(default)]
    pub timing: BTreeMap<String, serde_json::Value>,
}

fn encode_f64s(values: &[f64]) -> String {
    let bytes: Vec<u8> = values.iter().flat_map(|v| v.to_le_bytes()).collect();
    BASE64.encode(bytes)
}

fn decode_f64s(data: &str) -> DWaveResult<Vec<f64>> {
    let bytes = BASE64.decode(data)?;
    if bytes.len() % 8 != 0 {
        return Err(DWaveError::Codec(format!(
            "f64 buffer of {} bytes is not a multiple of 8",
            bytes.len()
        )));
    }
    Ok(bytes
        .chunks_exact(8)
        .map(|c| f64::from_le_bytes([c[0], c[1], c[2], c[3], c[4], c[5], c[6], c[7]]))
        .collect())
}

fn decode_i32s(data: &str) -> DWaveResult<Vec<i32>> {
    let bytes = BASE64.decode(data)?;
    if bytes.len() % 4 != 0 {
        return Err(DWaveError::Codec(format!(
            "i32 buffer of {} bytes is not a multiple of 4",
            bytes.len()
        )));
    }
    Ok(bytes
        .chunks_exact(4)
        .map(|c| i32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect())
}

/// Encode `model` against the solver's qubit and coupler layout.
pub fn encode_problem(model: &IsingModel, properties: &SolverProperties) -> DWaveResult<QpProblem> {
    let num_qubits = properties.num_qubits as usize;
    let mut lin = vec![f64::NAN; num_qubits];
    for node in model.variables() {
        let slot = lin.get_mut(node as usize).ok_or_else(|| {
            DWaveError::Codec(format!("qubit {node} beyond solver size {num_qubits}"))
        })?;
        *slot = model.bias(node);
    }

    let used = |q: NodeId| lin.get(q as usize).is_some_and(|v| !v.is_nan());
    let quad: Vec<f64> = properties
        .couplers
        .iter()
        .filter(|&&[u, v]| used(u) && used(v))
        .map(|&[u, v]| model.coupling(u, v))
        .collect();

    Ok(QpProblem {
        format: "qp".into(),
        lin: encode_f64s(&lin),
        quad: encode_f64s(&quad),
    })
}

/// Unpack `num_rows` rows of `num_vars` spins.
fn unpack_solutions(bytes: &[u8], num_rows: usize, num_vars: usize) -> DWaveResult<Vec<Vec<i8>>> {
    let row_bytes = num_vars.div_ceil(8);
    if bytes.len() != num_rows * row_bytes {
        return Err(DWaveError::Codec(format!(
            "solutions hold {} bytes, expected {} rows of {} bytes",
            bytes.len(),
            num_rows,
            row_bytes
        )));
    }
    if row_bytes == 0 {
        return Ok(vec![Vec::new(); num_rows]);
    }
    Ok(bytes
        .chunks_exact(row_bytes)
        .map(|row| {
            (0..num_vars)
                .map(|j| if row[j / 8] & (0x80 >> (j % 8)) != 0 { 1 } else { -1 })
                .collect()
        })
        .collect())
}

/// Decode an answer into a sample set.
///
/// `offset` is added to every energy; the solver reports energies without
/// the problem's constant term.
pub fn decode_answer(answer: &QpAnswer, answer_mode: AnswerMode, offset: f64) -> DWaveResult<SampleSet> {
    if answer.format != "qp" {
        return Err(DWaveError::Codec(format!(
            "unsupported answer format '{}'",
            answer.format
        )));
    }

    let variables: Vec<NodeId> = decode_i32s(&answer.active_variables)?
        .into_iter()
        .map(|v| NodeId::try_from(v).map_err(|_| DWaveError::Codec(format!("negative qubit index {v}"))))
        .collect::<DWaveResult<_>>()?;
    let energies = decode_f64s(&answer.energies)?;
    let occurrences = match answer.num_occurrences {
        Some(ref data) => decode_i32s(data)?,
        None => vec![1; energies.len()],
    };
    if occurrences.len() != energies.len() {
        return Err(DWaveError::Codec(format!(
            "{} energies but {} occurrence counts",
            energies.len(),
            occurrences.len()
        )));
    }

    let rows = unpack_solutions(&BASE64.decode(&answer.solutions)?, energies.len(), variables.len())?;

    let mut set = SampleSet::new(variables.clone(), answer_mode);
    for ((row, energy), count) in rows.into_iter().zip(energies).zip(occurrences) {
        let sample = SpinAssignment::from_pairs(variables.iter().copied().zip(row))?;
        let num_occurrences = u32::try_from(count)
            .map_err(|_| DWaveError::Codec(format!("negative occurrence count {count}")))?;
        set.push(SampleRecord {
            sample,
            energy: energy + offset,
            num_occurrences,
        });
    }

    let timing: Timing = answer
        .timing
        .iter()
        .filter_map(|(k, v)| v.as_f64().map(|t| (k.clone(), t)))
        .collect();
    Ok(set.with_timing(timing))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn encode_i32s(values: &[i32]) -> String {
        let bytes: Vec<u8> = values.iter().flat_map(|v| v.to_le_bytes()).collect();
        BASE64.encode(bytes)
    }

    fn pack_rows(rows: &[Vec<i8>]) -> Vec<u8> {
        let mut out = Vec::new();
        for row in rows {
            let mut bytes = vec![0u8; row.len().div_ceil(8)];
            for (j, &s) in row.iter().enumerate() {
                if s > 0 {
                    bytes[j / 8] |= 0x80 >> (j % 8);
                }
            }
            out.extend(bytes);
        }
        out
    }

    fn props() -> SolverProperties {
        // Qubit 2 is inactive.
        SolverProperties::from_graph(vec![0, 1, 3, 4], vec![[0, 1], [0, 4], [1, 3], [3, 4]])
    }

    #[test]
    fn test_encode_problem_layout() {
        let mut model = IsingModel::new();
        model.add_bias(0, 0.5);
        model.add_coupling(4, 0, -1.0);
        model.add_coupling(0, 1, 0.25);

        let qp = encode_problem(&model, &props()).unwrap();
        assert_eq!(qp.format, "qp");

        let lin = decode_f64s(&qp.lin).unwrap();
        assert_eq!(lin.len(), 5);
        assert_eq!(lin[0], 0.5);
        assert_eq!(lin[1], 0.0);
        assert!(lin[2].is_nan());
        assert!(lin[3].is_nan());
        assert_eq!(lin[4], 0.0);

        // Couplers [0,1] and [0,4] have both ends in use; [1,3] and [3,4] do not.
        assert_eq!(decode_f64s(&qp.quad).unwrap(), vec![0.25, -1.0]);
    }

    #[test]
    fn test_encode_rejects_out_of_range_qubit() {
        let mut model = IsingModel::new();
        model.add_bias(9, 1.0);
        assert!(matches!(encode_problem(&model, &props()), Err(DWaveError::Codec(_))));
    }

    #[test]
    fn test_decode_histogram_answer() {
        // Ten variables: rows span two bytes.
        let vars: Vec<i32> = (0..10).collect();
        let rows = vec![vec![1i8; 10], {
            let mut r = vec![-1i8; 10];
            r[0] = 1;
            r[9] = 1;
            r
        }];
        let answer = QpAnswer {
            format: "qp".into(),
            num_variables: Some(10),
            active_variables: encode_i32s(&vars),
            energies: encode_f64s(&[-9.0, -5.0]),
            num_occurrences: Some(encode_i32s(&[7, 3])),
            solutions: BASE64.encode(pack_rows(&rows)),
            timing: BTreeMap::from([
                ("qpu_access_time".to_string(), serde_json::json!(15000.5)),
                ("units".to_string(), serde_json::json!("us")),
            ]),
        };

        let set = decode_answer(&answer, AnswerMode::Histogram, 1.0).unwrap();
        assert_eq!(set.len(), 2);
        assert_eq!(set.total_reads(), 10);
        assert_eq!(set.records[0].energy, -8.0);
        assert_eq!(set.records[1].sample.get(0), Some(1));
        assert_eq!(set.records[1].sample.get(1), Some(-1));
        assert_eq!(set.records[1].sample.get(9), Some(1));
        assert_eq!(set.timing.get("qpu_access_time"), Some(&15000.5));
        assert!(!set.timing.contains_key("units"));
    }

    #[test]
    fn test_decode_raw_answer_without_occurrences() {
        let answer = QpAnswer {
            format: "qp".into(),
            num_variables: None,
            active_variables: encode_i32s(&[3, 7]),
            energies: encode_f64s(&[-1.0, 1.0, -1.0]),
            num_occurrences: None,
            // Rows: ++, +-, --  →  0b11.., 0b10.., 0b00..
            solutions: BASE64.encode([0b1100_0000u8, 0b1000_0000, 0b0000_0000]),
            timing: BTreeMap::new(),
        };
        let set = decode_answer(&answer, AnswerMode::Raw, 0.0).unwrap();
        assert_eq!(set.variables, vec![3, 7]);
        assert_eq!(set.total_reads(), 3);
        assert_eq!(set.records[1].sample.get(3), Some(1));
        assert_eq!(set.records[1].sample.get(7), Some(-1));
        assert_eq!(set.records[2].sample.get(3), Some(-1));
    }

    #[test]
    fn test_decode_rejects_short_solutions() {
        let answer = QpAnswer {
            format: "qp".into(),
            num_variables: None,
            active_variables: encode_i32s(&[0, 1]),
            energies: encode_f64s(&[0.0, 0.0]),
            num_occurrences: None,
            solutions: BASE64.encode([0u8]),
            timing: BTreeMap::new(),
        };
        assert!(matches!(
            decode_answer(&answer, AnswerMode::Raw, 0.0),
            Err(DWaveError::Codec(_))
        ));
    }

    #[test]
    fn test_answer_json_parsing() {
        let answer: QpAnswer = serde_json::from_value(serde_json::json!({
            "format": "qp",
            "num_variables": 5760,
            "active_variables": encode_i32s(&[30, 31]),
            "energies": encode_f64s(&[-1.0]),
            "solutions": BASE64.encode([0b0100_0000u8]),
            "timing": {"qpu_sampling_time": 80.0}
        }))
        .unwrap();
        let set = decode_answer(&answer, AnswerMode::Raw, 0.0).unwrap();
        assert_eq!(set.records[0].sample.get(30), Some(-1));
        assert_eq!(set.records[0].sample.get(31), Some(1));
    }

    proptest! {
        #[test]
        fn unpack_matches_packing(rows in prop::collection::vec(prop::collection::vec(prop::bool::ANY, 13), 1..8)) {
            let spins: Vec<Vec<i8>> = rows
                .iter()
                .map(|r| r.iter().map(|&b| if b { 1 } else { -1 }).collect())
                .collect();
            let unpacked = unpack_solutions(&pack_rows(&spins), spins.len(), 13).unwrap();
            prop_assert_eq!(unpacked, spins);
        }
    }
}
