use anyhow::Context;
use futures::TryStreamExt;
use mongodb::bson::doc;
use mongodb::Database;
use rand::seq::index;
use validator::Validate;

use crate::errors::QuizError;
use crate::models::{Question, QuestionSeed};

const COLLECTION: &str = "questions";

/// Read-mostly store of multiple-choice questions. Seeded once from JSON,
/// queried per request; never mutated while a quiz is in flight.
pub struct QuestionStore {
    mongo: Database,
}

impl QuestionStore {
    pub fn new(mongo: Database) -> Self {
        Self { mongo }
    }

    fn collection(&self) -> mongodb::Collection<Question> {
        self.mongo.collection::<Question>(COLLECTION)
    }

    /// Replaces the entire store contents with the given seed records.
    ///
    /// Every record is validated before anything is written, so a bad
    /// record aborts the whole batch and the old rows stay in place.
    /// Identifiers are assigned sequentially from 1 in seed order.
    pub async fn load(&self, seeds: Vec<QuestionSeed>) -> Result<usize, QuizError> {
        for (i, seed) in seeds.iter().enumerate() {
            seed.validate()
                .map_err(|e| QuizError::Validation(format!("record {}: {}", i + 1, e)))?;
        }

        let questions: Vec<Question> = seeds
            .into_iter()
            .enumerate()
            .map(|(i, seed)| seed.into_question(i as i64 + 1))
            .collect();

        let collection = self.collection();
        collection
            .delete_many(doc! {})
            .await
            .context("Failed to clear questions collection")?;

        let count = questions.len();
        if count > 0 {
            collection
                .insert_many(questions)
                .await
                .context("Failed to insert questions")?;
        }

        tracing::info!("Question store loaded with {} questions", count);
        Ok(count)
    }

    /// Uniform random sample of `n` distinct question ids, without
    /// replacement. `n == store size` yields the whole store in random
    /// order; anything larger is an error, never a truncated sample.
    pub async fn sample(&self, n: usize) -> Result<Vec<i64>, QuizError> {
        let ids = self.all_ids().await?;

        if n > ids.len() {
            return Err(QuizError::InsufficientQuestions {
                requested: n,
                available: ids.len(),
            });
        }

        let mut rng = rand::rng();
        let sampled = index::sample(&mut rng, ids.len(), n)
            .into_iter()
            .map(|i| ids[i])
            .collect();

        Ok(sampled)
    }

    pub async fn get(&self, id: i64) -> Result<Question, QuizError> {
        self.collection()
            .find_one(doc! { "_id": id })
            .await
            .context("Failed to query question")?
            .ok_or(QuizError::NotFound(id))
    }

    pub async fn count(&self) -> Result<u64, QuizError> {
        let count = self
            .collection()
            .count_documents(doc! {})
            .await
            .context("Failed to count questions")?;
        Ok(count)
    }

    async fn all_ids(&self) -> Result<Vec<i64>, QuizError> {
        let mut cursor = self
            .collection()
            .find(doc! {})
            .await
            .context("Failed to query questions")?;

        let mut ids = Vec::new();
        while let Some(question) = cursor.try_next().await.context("Question cursor error")? {
            ids.push(question.id);
        }
        Ok(ids)
    }
}
