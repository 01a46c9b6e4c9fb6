use chrono::NaiveDate;

use sape_shared::models::Activity;
use sape_shared::{PlaceId, SportId};

use crate::store::EntityStore;

impl EntityStore<Activity> {
    /// Activities on `date`, earliest start first.
    pub fn on_date(&self, date: NaiveDate) -> Vec<Activity> {
        let mut day: Vec<Activity> = self
            .get_all()
            .iter()
            .filter(|a| a.activity_date == date)
            .cloned()
            .collect();
        day.sort_by_key(|a| a.start_time);
        day
    }

    pub fn for_place(&self, place: &PlaceId) -> Vec<Activity> {
        self.matching(|a| &a.place_id == place)
    }

    pub fn for_sport(&self, sport: &SportId) -> Vec<Activity> {
        self.matching(|a| &a.sport_id == sport)
    }

    fn matching(&self, pred: impl Fn(&Activity) -> bool) -> Vec<Activity> {
        self.get_all().iter().filter(|a| pred(a)).cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use sape_shared::constants::ACTIVITIES_KEY;

    use super::*;
    use crate::backend::LocalBackend;
    use crate::storage::{KeyValueStore, SqliteStorage};

    fn activity(title: &str, day: u32, start: &str, finish: &str, place: &str) -> Activity {
        Activity {
            id: None,
            title: title.into(),
            sport_id: SportId::from("1"),
            place_id: PlaceId::from(place),
            activity_date: NaiveDate::from_ymd_opt(2025, 3, day).unwrap(),
            start_time: start.parse().unwrap(),
            finish_time: finish.parse().unwrap(),
            is_private: false,
        }
    }

    #[tokio::test]
    async fn test_day_view_is_sorted_by_start() {
        let storage: Arc<dyn KeyValueStore> = Arc::new(SqliteStorage::in_memory().unwrap());
        let store: EntityStore<Activity> =
            EntityStore::new(Arc::new(LocalBackend::new(storage, ACTIVITIES_KEY)));
        store.load().await.unwrap();

        store.add(activity("Treino noturno", 10, "19:00", "20:00", "p1")).await.unwrap();
        store.add(activity("Pelada matinal", 10, "08:00", "09:00", "p2")).await.unwrap();
        store.add(activity("Amistoso", 11, "10:00", "11:00", "p1")).await.unwrap();

        let day: Vec<String> = store
            .on_date(NaiveDate::from_ymd_opt(2025, 3, 10).unwrap())
            .into_iter()
            .map(|a| a.title)
            .collect();
        assert_eq!(day, vec!["Pelada matinal", "Treino noturno"]);

        assert_eq!(store.for_place(&PlaceId::from("p1")).len(), 2);
        assert_eq!(store.for_sport(&SportId::from("1")).len(), 3);
        assert!(store.for_sport(&SportId::from("9")).is_empty());
    }
}
