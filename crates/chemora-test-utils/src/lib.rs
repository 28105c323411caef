//! Fixture graphs shared by the Chemora test suites.

use std::path::{Path, PathBuf};

use chemora_common::Graph;
use serde_json::{json, Value};

/// A small but realistic expert graph: seven methods spanning the accuracy
/// and cost spectrum, four basis sets (two without accuracy annotations,
/// one of those unnamed), concepts, and use cases.
pub fn fixture_graph_value() -> Value {
    json!({
        "Methods": [
            {
                "id": "hf",
                "name": "Hartree-Fock",
                "category": "wavefunction",
                "description": "Mean-field self-consistent field method without electron correlation.",
                "accuracy_level": "low",
                "complexity": "O(N^4)",
                "typical_use_cases": ["initial guesses", "orbital analysis"],
                "software": ["PySCF", "Psi4", "ORCA", "Gaussian"],
                "citations": 5000
            },
            {
                "id": "b3lyp",
                "name": "DFT B3LYP",
                "category": "density functional",
                "description": "Hybrid density functional theory with exchange-correlation; the workhorse for geometry optimization of organic molecules.",
                "accuracy_level": "medium_high",
                "complexity": "O(N^3)",
                "typical_use_cases": ["geometry optimization", "reaction energies"],
                "software": ["PySCF", "Psi4", "ORCA", "Gaussian", "Q-Chem"],
                "citations": 90000
            },
            {
                "id": "mp2",
                "name": "MP2",
                "category": "wavefunction",
                "description": "Second-order Moller-Plesset perturbation theory capturing dynamic electron correlation and dispersion.",
                "accuracy_level": "medium",
                "complexity": "O(N^5)",
                "typical_use_cases": ["noncovalent interactions"],
                "software": ["PySCF", "Psi4", "ORCA"],
                "citations": 12000
            },
            {
                "id": "ccsd_t",
                "name": "CCSD(T)",
                "category": "coupled cluster",
                "description": "Coupled cluster with singles, doubles and perturbative triples; the gold standard for electron correlation in thermochemistry.",
                "accuracy_level": "benchmark",
                "complexity": "O(N^7)",
                "typical_runtime": "days",
                "typical_use_cases": ["benchmark thermochemistry", "reaction barriers"],
                "software": ["PySCF", "Psi4", "ORCA", "MRCC"],
                "citations": 8000
            },
            {
                "id": "dlpno_ccsd_t",
                "name": "DLPNO-CCSD(T)",
                "category": "coupled cluster",
                "description": "Domain-based local pair natural orbital coupled cluster approaching CCSD(T) accuracy for large molecules.",
                "accuracy_level": "very_high",
                "scaling": "near-linear, formally N^1",
                "typical_use_cases": ["large molecule thermochemistry"],
                "software": ["ORCA"],
                "citations": 2500
            },
            {
                "id": "casscf",
                "name": "CASSCF",
                "category": "multireference",
                "description": "Complete active space self-consistent field for static correlation, excited states and bond breaking.",
                "accuracy_level": "high",
                "complexity": "exponential in active space",
                "typical_use_cases": ["excited states", "bond dissociation"],
                "software": ["OpenMolcas", "PySCF"],
                "citations": 4000
            },
            {
                "id": "pm7",
                "name": "PM7",
                "category": "semiempirical",
                "description": "Parameterized semiempirical method for very fast screening.",
                "accuracy_level": "very_low",
                "complexity": "O(N^2)",
                "typical_use_cases": ["screening"],
                "software": ["MOPAC"]
            }
        ],
        "BasisSets": [
            {"id": "sto3g", "name": "STO-3G"},
            {"id": "631gs", "name": "6-31G*", "effects_on_accuracy": "adequate for geometries"},
            {"id": "ccpvtz", "name": "cc-pVTZ", "accuracy_level": "high"},
            {"id": "bs_anon"}
        ],
        "Concepts": [
            {
                "id": "c_corr",
                "name": "electron correlation",
                "description": "Energy beyond the mean-field description.",
                "related_methods": ["mp2", "ccsd_t"]
            },
            {
                "id": "c_disp",
                "name": "dispersion",
                "description": "Long-range attractive interaction missing from many functionals."
            },
            {
                "id": "c_bsse",
                "name": "basis set superposition error",
                "description": "Artificial stabilization of complexes from borrowed basis functions."
            }
        ],
        "Hamiltonians": [
            {"id": "h_el", "name": "Electronic Hamiltonian"}
        ],
        "UseCases": [
            {"id": "uc_thermo", "name": "Thermochemistry"}
        ],
        "metadata": {
            "version": "2024.1",
            "sources": ["curated"],
            "expert_layer": {
                "added_entity_types": ["Concepts", "UseCases"],
                "description": "expert knowledge layer"
            }
        }
    })
}

pub fn fixture_graph() -> Graph {
    Graph::from_value(fixture_graph_value()).expect("fixture graph is valid")
}

/// A valid graph with an empty `Methods` section and nothing else.
pub fn empty_graph() -> Graph {
    Graph::from_value(json!({
        "Methods": [],
        "metadata": {"expert_layer": {"added_entity_types": []}}
    }))
    .expect("empty graph is valid")
}

/// A valid graph whose only section is `Methods` with the given records.
pub fn graph_with_methods(methods: Vec<Value>) -> Graph {
    Graph::from_value(json!({
        "Methods": methods,
        "metadata": {"expert_layer": {"added_entity_types": []}}
    }))
    .expect("method graph is valid")
}

/// Write a graph document to `dir/name` and return the path.
pub fn write_graph(dir: &Path, name: &str, value: &Value) -> anyhow::Result<PathBuf> {
    let path = dir.join(name);
    std::fs::write(&path, serde_json::to_string_pretty(value)?)?;
    Ok(path)
}

/// A scratch directory removed on drop.
pub fn scratch_dir() -> tempfile::TempDir {
    tempfile::tempdir().expect("create temp dir")
}
