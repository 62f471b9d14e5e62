//! Routine store — the in-memory routine collection mirroring the device.
//!
//! The collection is fetched once with [`RoutineStore::load`], edited locally,
//! and pushed back whole with [`RoutineStore::save`]. Nothing reaches the
//! device in between. Routines have no identity beyond their position.

use sprinkler_domain::error::{DeviceError, SprinklerError};
use sprinkler_domain::event::DashboardEvent;
use sprinkler_domain::notice::Notice;
use sprinkler_domain::routine::Routine;

use crate::ports::{Confirmation, DeviceApi, EventPublisher, RoutinesPayload};

/// Prompt shown before a routine is deleted.
pub const DELETE_PROMPT: &str = "Delete this routine?";

/// Application service holding the routine collection and the selection.
pub struct RoutineStore<D, P> {
    device: D,
    publisher: P,
    routines: Vec<Routine>,
    selected: Option<usize>,
}

impl<D, P> RoutineStore<D, P>
where
    D: DeviceApi + Send + Sync,
    P: EventPublisher + Send + Sync,
{
    /// Create an empty store. Call [`Self::load`] to fetch the device's copy.
    pub fn new(device: D, publisher: P) -> Self {
        Self {
            device,
            publisher,
            routines: Vec::new(),
            selected: None,
        }
    }

    #[must_use]
    pub fn routines(&self) -> &[Routine] {
        &self.routines
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.routines.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.routines.is_empty()
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Routine> {
        self.routines.get(index)
    }

    #[must_use]
    pub fn selected_index(&self) -> Option<usize> {
        self.selected
    }

    #[must_use]
    pub fn selected(&self) -> Option<&Routine> {
        self.selected.and_then(|index| self.routines.get(index))
    }

    /// The routine the step editor operates on.
    pub fn selected_mut(&mut self) -> Option<&mut Routine> {
        self.selected.and_then(|index| self.routines.get_mut(index))
    }

    /// Replace the collection with the device's copy.
    ///
    /// On failure the store is left empty with no selection and an error
    /// notice is published. There is no retry.
    ///
    /// # Errors
    ///
    /// Returns the device error that prevented loading.
    pub async fn load(&mut self) -> Result<(), SprinklerError> {
        self.selected = None;
        match self.device.routines().await {
            Ok(routines) => {
                tracing::info!(count = routines.len(), "routines loaded");
                self.routines = routines;
                self.publish(DashboardEvent::RoutinesChanged {
                    count: self.routines.len(),
                })
                .await;
                Ok(())
            }
            Err(err) => {
                tracing::warn!(error = %err, "failed to fetch routines");
                self.routines.clear();
                self.publish(Notice::error(format!("Failed to load routines: {err}")).into())
                    .await;
                Err(err)
            }
        }
    }

    /// Append an empty routine named after its position and select it.
    pub fn create(&mut self) -> usize {
        let index = self.routines.len();
        self.routines.push(Routine::new(format!("Routine {}", index + 1)));
        self.selected = Some(index);
        tracing::debug!(index, "routine created");
        index
    }

    /// Select the routine at `index`; an out-of-range index clears the selection.
    pub fn select(&mut self, index: usize) -> Option<&Routine> {
        self.selected = (index < self.routines.len()).then_some(index);
        self.selected()
    }

    pub fn deselect(&mut self) {
        self.selected = None;
    }

    /// Rename the routine at `index`. Unknown indices are ignored.
    pub fn rename(&mut self, index: usize, name: impl Into<String>) -> bool {
        match self.routines.get_mut(index) {
            Some(routine) => {
                routine.name = name.into();
                true
            }
            None => false,
        }
    }

    /// Delete the routine at `index` once the user confirms.
    ///
    /// The selection keeps pointing at the same routine: it is cleared when
    /// that routine is deleted and shifted down when an earlier one is.
    pub async fn delete(&mut self, index: usize, confirmation: &impl Confirmation) -> bool {
        if index >= self.routines.len() {
            return false;
        }
        if !confirmation.confirm(DELETE_PROMPT).await {
            return false;
        }

        let removed = self.routines.remove(index);
        tracing::info!(index, name = %removed.name, "routine deleted");
        self.selected = match self.selected {
            Some(selected) if selected == index => None,
            Some(selected) if selected > index => Some(selected - 1),
            other => other,
        };
        true
    }

    /// Push the whole collection to the device in a single request.
    ///
    /// # Errors
    ///
    /// Returns a validation error when the payload exceeds the device limit
    /// (nothing is sent), or the device error of a failed request. Both are
    /// also published as error notices.
    pub async fn save(&mut self) -> Result<(), SprinklerError> {
        let payload = match RoutinesPayload::encode(&self.routines) {
            Ok(payload) => payload,
            Err(err) => {
                tracing::warn!(error = %err, "routines not sent");
                self.publish(Notice::error(format!("Error saving routines: {err}")).into())
                    .await;
                return Err(err);
            }
        };

        tracing::debug!(bytes = payload.len(), "saving routines");
        match self.device.save_routines(payload).await {
            Ok(()) => {
                tracing::info!(count = self.routines.len(), "routines saved");
                self.publish(Notice::success("Routines saved").into()).await;
                self.publish(DashboardEvent::RoutinesChanged {
                    count: self.routines.len(),
                })
                .await;
                Ok(())
            }
            Err(err) => {
                tracing::warn!(error = %err, "failed to save routines");
                let message = match &err {
                    SprinklerError::Device(DeviceError::Status { message, .. }) => {
                        format!("Failed to save routines, error was: {message}")
                    }
                    other => format!("Error saving routines: {other}"),
                };
                self.publish(Notice::error(message).into()).await;
                Err(err)
            }
        }
    }

    async fn publish(&self, event: DashboardEvent) {
        if let Err(err) = self.publisher.publish(event).await {
            tracing::warn!(error = %err, "failed to publish dashboard event");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Answer, FakeDevice, RecordingPublisher};
    use sprinkler_domain::error::ValidationError;
    use sprinkler_domain::notice::NoticeLevel;
    use sprinkler_domain::relay::RelayId;
    use sprinkler_domain::routine::MoveDirection;
    use std::sync::Arc;

    type Store = RoutineStore<Arc<FakeDevice>, Arc<RecordingPublisher>>;

    fn store() -> (Store, Arc<FakeDevice>, Arc<RecordingPublisher>) {
        let device = Arc::new(FakeDevice::default());
        let publisher = Arc::new(RecordingPublisher::default());
        (
            RoutineStore::new(Arc::clone(&device), Arc::clone(&publisher)),
            device,
            publisher,
        )
    }

    fn relay(raw: u8) -> RelayId {
        RelayId::new(raw).unwrap()
    }

    #[tokio::test]
    async fn should_load_routines_from_device() {
        let (mut store, device, _) = store();
        *device.routines_reply.lock().unwrap() =
            Some(vec![Routine::new("Morning"), Routine::new("Evening")]);

        store.load().await.unwrap();

        assert_eq!(store.len(), 2);
        assert_eq!(store.get(1).unwrap().name, "Evening");
        assert_eq!(store.selected_index(), None);
    }

    #[tokio::test]
    async fn should_leave_store_empty_and_notify_when_load_fails() {
        let (mut store, _, publisher) = store();
        store.create();

        let result = store.load().await;

        assert!(result.is_err());
        assert!(store.is_empty());
        assert_eq!(store.selected_index(), None);
        assert_eq!(publisher.last_notice().unwrap().level, NoticeLevel::Error);
    }

    #[tokio::test]
    async fn should_create_numbered_routine_and_select_it() {
        let (mut store, device, _) = store();
        *device.routines_reply.lock().unwrap() = Some(vec![Routine::new("Existing")]);
        store.load().await.unwrap();

        let index = store.create();

        assert_eq!(index, 1);
        assert_eq!(store.get(1).unwrap().name, "Routine 2");
        assert!(store.get(1).unwrap().steps.is_empty());
        assert_eq!(store.selected_index(), Some(1));
        assert!(device.saved.lock().unwrap().is_empty());
    }

    #[test]
    fn should_clear_selection_for_out_of_range_index() {
        let (mut store, _, _) = store();
        store.create();
        assert!(store.select(0).is_some());
        assert!(store.select(5).is_none());
        assert_eq!(store.selected_index(), None);
    }

    #[test]
    fn should_rename_locally() {
        let (mut store, _, _) = store();
        store.create();
        assert!(store.rename(0, "Lawn"));
        assert!(!store.rename(3, "Nope"));
        assert_eq!(store.get(0).unwrap().name, "Lawn");
    }

    #[tokio::test]
    async fn should_not_delete_without_confirmation() {
        let (mut store, _, _) = store();
        store.create();
        let answer = Answer::no();

        assert!(!store.delete(0, &answer).await);

        assert_eq!(store.len(), 1);
        assert_eq!(*answer.prompts.lock().unwrap(), vec![DELETE_PROMPT]);
    }

    #[tokio::test]
    async fn should_clear_selection_when_selected_routine_is_deleted() {
        let (mut store, _, _) = store();
        store.create();
        store.create();

        assert!(store.delete(1, &Answer::yes()).await);

        assert_eq!(store.len(), 1);
        assert_eq!(store.selected_index(), None);
    }

    #[tokio::test]
    async fn should_shift_selection_when_earlier_routine_is_deleted() {
        let (mut store, _, _) = store();
        store.create();
        store.create();
        store.create();
        store.select(2);

        store.delete(0, &Answer::yes()).await;

        assert_eq!(store.selected_index(), Some(1));
        assert_eq!(store.selected().unwrap().name, "Routine 3");
    }

    #[tokio::test]
    async fn should_save_whole_collection_with_sorted_steps() {
        let (mut store, device, publisher) = store();
        store.create();
        let routine = store.selected_mut().unwrap();
        routine.add_step(relay(0), "Plants");
        routine.add_step(relay(1), "Grass");
        routine.move_step(1, MoveDirection::Earlier);
        store.create();

        store.save().await.unwrap();

        let saved = device.saved.lock().unwrap();
        assert_eq!(saved.len(), 1);
        let body: serde_json::Value = serde_json::from_str(&saved[0]).unwrap();
        assert_eq!(body.as_array().unwrap().len(), 2);
        assert_eq!(body[0]["steps"][0]["name"], "Grass");
        assert_eq!(
            publisher.last_notice(),
            Some(Notice::success("Routines saved"))
        );
    }

    #[tokio::test]
    async fn should_report_status_text_when_save_fails() {
        let (mut store, device, publisher) = store();
        *device.save_failure.lock().unwrap() = Some(500);
        store.create();

        let result = store.save().await;

        assert!(result.is_err());
        assert_eq!(
            publisher.last_notice(),
            Some(Notice::error(
                "Failed to save routines, error was: Internal Server Error"
            ))
        );
    }

    #[tokio::test]
    async fn should_reject_oversized_collection_before_sending() {
        let (mut store, device, publisher) = store();
        store.create();
        let routine = store.selected_mut().unwrap();
        for _ in 0..80 {
            routine.add_step(relay(2), "Patio Grass");
        }

        let err = store.save().await.unwrap_err();

        assert!(matches!(
            err,
            SprinklerError::Validation(ValidationError::PayloadTooLarge { .. })
        ));
        assert!(device.saved.lock().unwrap().is_empty());
        assert!(publisher.last_notice().unwrap().is_error());
    }
}
