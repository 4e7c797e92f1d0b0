use crate::mmr::MmrCandidate;
use crate::models::Passage;

#[derive(Debug, Clone, PartialEq)]
pub struct StoreHit {
    pub id: String,
    pub score: f32,
    pub text: String,
    pub page_label: Option<String>,
    pub vector: Vec<f32>,
}

impl StoreHit {
    pub fn into_mmr_candidate(self) -> MmrCandidate<Passage> {
        MmrCandidate {
            item: Passage {
                text: self.text,
                page_label: self.page_label,
                score: self.score,
            },
            vector: self.vector,
        }
    }
}
