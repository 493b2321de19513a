/// Trained-generator facade: validation, preparation, writeback
pub mod generator;
/// Generation-order engine over the classifier weights
pub mod predictor;
/// Candidate domains, undo trail, and arc-consistency revision
pub mod revision;
/// Backtracking search with ordering heuristics and forceful repair
pub mod solver;
/// Epoch orchestration, learning-rate schedule, and build signals
pub mod trainer;
/// Logistic-regression weight tensor
pub mod weights;
