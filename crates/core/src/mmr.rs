//! Maximal marginal relevance re-ranking.
//!
//! `MMR = λ × sim(query, doc) - (1 - λ) × max(sim(doc, selected))`

#[derive(Debug, Clone)]
pub struct MmrCandidate<T> {
    pub item: T,
    pub vector: Vec<f32>,
}

pub fn cosine_similarity(left: &[f32], right: &[f32]) -> f32 {
    if left.len() != right.len() || left.is_empty() {
        return 0.0;
    }

    let dot = left.iter().zip(right).map(|(a, b)| a * b).sum::<f32>();
    let left_mag = magnitude(left);
    let right_mag = magnitude(right);
    if left_mag == 0.0 || right_mag == 0.0 {
        return 0.0;
    }
    dot / (left_mag * right_mag)
}

fn magnitude(vector: &[f32]) -> f32 {
    vector.iter().map(|value| value * value).sum::<f32>().sqrt()
}

pub fn mmr_rerank<T>(query: &[f32], candidates: Vec<MmrCandidate<T>>, k: usize, lambda: f32) -> Vec<T> {
    if candidates.is_empty() || k == 0 {
        return Vec::new();
    }

    let lambda = lambda.clamp(0.0, 1.0);
    let k = k.min(candidates.len());

    let relevance: Vec<f32> = candidates
        .iter()
        .map(|candidate| cosine_similarity(query, &candidate.vector))
        .collect();

    let mut remaining: Vec<usize> = (0..candidates.len()).collect();
    let mut selected: Vec<usize> = Vec::with_capacity(k);

    while selected.len() < k && !remaining.is_empty() {
        let mut best_position = 0;
        let mut best_score = f32::NEG_INFINITY;

        for (position, &index) in remaining.iter().enumerate() {
            let redundancy = selected
                .iter()
                .map(|&chosen| cosine_similarity(&candidates[index].vector, &candidates[chosen].vector))
                .fold(f32::NEG_INFINITY, f32::max);
            let redundancy = if selected.is_empty() { 0.0 } else { redundancy };

            let score = lambda * relevance[index] - (1.0 - lambda) * redundancy;
            if score > best_score {
                best_score = score;
                best_position = position;
            }
        }

        selected.push(remaining.remove(best_position));
    }

    let mut slots: Vec<Option<T>> = candidates.into_iter().map(|candidate| Some(candidate.item)).collect();
    selected
        .into_iter()
        .filter_map(|index| slots[index].take())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(id: &'static str, vector: Vec<f32>) -> MmrCandidate<&'static str> {
        MmrCandidate { item: id, vector }
    }

    #[test]
    fn cosine_of_identical_vectors_is_one() {
        let similarity = cosine_similarity(&[1.0, 2.0, 3.0], &[1.0, 2.0, 3.0]);
        assert!((similarity - 1.0).abs() < 1e-6);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
        assert_eq!(cosine_similarity(&[1.0], &[1.0, 0.0]), 0.0);
    }

    #[test]
    fn first_pick_is_most_relevant() {
        let query = [1.0, 0.0];
        let picks = mmr_rerank(
            &query,
            vec![
                candidate("far", vec![0.0, 1.0]),
                candidate("near", vec![1.0, 0.05]),
            ],
            1,
            0.5,
        );
        assert_eq!(picks, vec!["near"]);
    }

    #[test]
    fn duplicates_are_pushed_down_for_diversity() {
        let query = [1.0, 0.2];
        let picks = mmr_rerank(
            &query,
            vec![
                candidate("a", vec![1.0, 0.0]),
                candidate("a-copy", vec![1.0, 0.0]),
                candidate("different", vec![0.6, 0.8]),
            ],
            2,
            0.5,
        );
        assert_eq!(picks, vec!["a", "different"]);
    }

    #[test]
    fn pure_relevance_keeps_similarity_order() {
        let query = [1.0, 0.0];
        let picks = mmr_rerank(
            &query,
            vec![
                candidate("b", vec![0.6, 0.8]),
                candidate("a", vec![1.0, 0.0]),
                candidate("a-copy", vec![1.0, 0.01]),
            ],
            3,
            1.0,
        );
        assert_eq!(picks, vec!["a", "a-copy", "b"]);
    }

    #[test]
    fn k_is_capped_by_candidate_count() {
        let picks = mmr_rerank(&[1.0], vec![candidate("only", vec![1.0])], 4, 0.5);
        assert_eq!(picks, vec!["only"]);
        let none: Vec<&str> = mmr_rerank(&[1.0], vec![candidate("x", vec![1.0])], 0, 0.5);
        assert!(none.is_empty());
    }
}
