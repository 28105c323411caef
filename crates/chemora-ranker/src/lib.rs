//! chemora-ranker - Method ranking, filtering, and lexical suggestion.

pub mod lexical;
pub mod normalise;
pub mod query;
pub mod scorer;
pub mod weights;

pub use lexical::{lexical_scores, suggest, LexicalSearcher};
pub use normalise::MethodFeatures;
pub use query::{filter_methods, MethodFilter};
pub use scorer::{
    CompositePolicy, EfficiencyPolicy, EfficiencyRankedMethod, RankedMethod, Ranker, RankingPolicy,
};
pub use weights::WeightVector;
