//! Emotion statistics use case

use thiserror::Error;
use tracing::debug;

use crate::domain::diary::{MonthlyStatistics, YearlyStatistics};

use super::ports::{DiaryApi, DiaryApiError};

/// Errors from the statistics use case
#[derive(Debug, Error)]
pub enum StatisticsError {
    #[error("{0}")]
    Api(#[from] DiaryApiError),

    #[error("Invalid month: {0} (expected 1-12)")]
    InvalidMonth(u32),
}

/// Computes emotion statistics from the backend's day records
pub struct StatisticsService<A: DiaryApi> {
    api: A,
}

impl<A: DiaryApi> StatisticsService<A> {
    pub fn new(api: A) -> Self {
        Self { api }
    }

    /// Diary count, emotion tally and day grid of a year
    pub async fn yearly(&self, year: i32) -> Result<YearlyStatistics, StatisticsError> {
        let (diaries, days) = tokio::try_join!(self.api.list_diaries(), self.api.list_days())?;
        debug!(year, diaries = diaries.len(), days = days.len(), "computing yearly statistics");
        Ok(YearlyStatistics::compute(year, &diaries, &days))
    }

    /// Day count, emotion tally and daily emotions of a month
    pub async fn monthly(&self, year: i32, month: u32) -> Result<MonthlyStatistics, StatisticsError> {
        if !(1..=12).contains(&month) {
            return Err(StatisticsError::InvalidMonth(month));
        }
        let days = self.api.list_days().await?;
        debug!(year, month, days = days.len(), "computing monthly statistics");
        Ok(MonthlyStatistics::compute(year, month, &days))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::diary::{
        Day, DiaryDate, DiaryId, DiaryRecord, DiarySubmission, Emotion,
    };
    use async_trait::async_trait;

    struct FixedApi;

    fn day(y: i32, m: u32, d: u32, emotion: Option<Emotion>) -> Day {
        Day {
            date: DiaryDate::from_ymd(y, m, d).unwrap(),
            emotion,
        }
    }

    #[async_trait]
    impl DiaryApi for FixedApi {
        async fn get_diary(&self, _date: DiaryDate) -> Result<Option<DiaryRecord>, DiaryApiError> {
            Ok(None)
        }

        async fn list_diaries(&self) -> Result<Vec<DiaryRecord>, DiaryApiError> {
            let entry = |m: u32, d: u32| DiaryRecord {
                id: Some(DiaryId::new(d as i64)),
                date: DiaryDate::from_ymd(2024, m, d).unwrap(),
                content: String::new(),
                audio_path: None,
                emotion: None,
                comment: None,
            };
            Ok(vec![entry(1, 3), entry(2, 14), entry(2, 15)])
        }

        async fn save_diary(&self, _s: &DiarySubmission) -> Result<DiaryRecord, DiaryApiError> {
            Err(DiaryApiError::ApiError("read only".into()))
        }

        async fn finalize_diary(&self, _s: &DiarySubmission) -> Result<DiaryRecord, DiaryApiError> {
            Err(DiaryApiError::ApiError("read only".into()))
        }

        async fn update_day_emotion(
            &self,
            _date: DiaryDate,
            _emotion: Emotion,
        ) -> Result<Day, DiaryApiError> {
            Err(DiaryApiError::ApiError("read only".into()))
        }

        async fn list_days(&self) -> Result<Vec<Day>, DiaryApiError> {
            Ok(vec![
                day(2024, 1, 3, Some(Emotion::Joy)),
                day(2024, 2, 14, Some(Emotion::Anger)),
                day(2024, 2, 15, Some(Emotion::Joy)),
                day(2024, 2, 16, None),
                day(2023, 2, 14, Some(Emotion::Sadness)),
            ])
        }

        async fn download_audio(&self, _id: DiaryId) -> Result<Vec<u8>, DiaryApiError> {
            Ok(vec![])
        }

        async fn login(&self, _email: &str, _password: &str) -> Result<String, DiaryApiError> {
            Err(DiaryApiError::Unauthorized)
        }
    }

    #[tokio::test]
    async fn yearly_counts_all_emotions() {
        let stats = StatisticsService::new(FixedApi).yearly(2024).await.unwrap();
        assert_eq!(stats.total_diaries, 3);
        assert_eq!(stats.tally.count(Emotion::Joy), 2);
        assert_eq!(stats.tally.count(Emotion::Anger), 1);
        assert_eq!(stats.tally.count(Emotion::Sadness), 0);
        assert_eq!(stats.grid[1][13], Some(Emotion::Anger));
    }

    #[tokio::test]
    async fn monthly_counts_days_in_month() {
        let stats = StatisticsService::new(FixedApi).monthly(2024, 2).await.unwrap();
        assert_eq!(stats.total_days, 3);
        assert_eq!(stats.tally.total(), 2);
        assert_eq!(stats.daily[14], Some(Emotion::Joy));
        assert_eq!(stats.daily[15], None);
    }

    #[tokio::test]
    async fn monthly_rejects_invalid_month() {
        let result = StatisticsService::new(FixedApi).monthly(2024, 13).await;
        assert!(matches!(result, Err(StatisticsError::InvalidMonth(13))));
    }
}
