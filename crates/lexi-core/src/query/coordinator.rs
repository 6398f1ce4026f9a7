use super::model::{DisplayState, NO_CORRECTION_TEXT, QueryMode, QueryRequest, WordResult};
use super::service::{CorrectionService, LookupService};
use crate::error::Result;
use crate::notification::Notifier;
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, watch};
use tokio::task::JoinHandle;

/// Debounce state of one mode.
#[derive(Default)]
struct Pipeline {
    input: String,
    /// Highest sequence number issued so far.
    issued: u64,
    /// Sequence whose response may still be applied. Cleared by empty input
    /// so an in-flight response cannot repopulate a cleared display.
    live: Option<u64>,
    timer: Option<JoinHandle<()>>,
    /// Identifies the armed timer; a timer that lost a race with a newer
    /// input sees a different value and stands down.
    timer_generation: u64,
}

impl Pipeline {
    fn cancel_timer(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
        self.timer_generation += 1;
    }
}

struct CoordinatorState {
    active: QueryMode,
    word: Pipeline,
    sentence: Pipeline,
}

impl CoordinatorState {
    fn pipeline(&self, mode: QueryMode) -> &Pipeline {
        match mode {
            QueryMode::Word => &self.word,
            QueryMode::Sentence => &self.sentence,
        }
    }

    fn pipeline_mut(&mut self, mode: QueryMode) -> &mut Pipeline {
        match mode {
            QueryMode::Word => &mut self.word,
            QueryMode::Sentence => &mut self.sentence,
        }
    }
}

enum QueryResponse {
    Word(WordResult),
    Sentence(String),
}

struct Inner {
    lookup: Arc<dyn LookupService>,
    correction: Arc<dyn CorrectionService>,
    notifier: Notifier,
    debounce: Duration,
    state: Mutex<CoordinatorState>,
    display: watch::Sender<DisplayState>,
}

/// Debounced dispatcher for the word and sentence modes.
///
/// Each mode debounces its own input and numbers its dispatches. A response
/// is applied only if it carries the mode's live sequence number and its mode
/// is still active; everything else is dropped on arrival. In-flight requests
/// are never cancelled, only ignored.
#[derive(Clone)]
pub struct QueryCoordinator {
    inner: Arc<Inner>,
}

impl QueryCoordinator {
    pub fn new(
        lookup: Arc<dyn LookupService>,
        correction: Arc<dyn CorrectionService>,
        notifier: Notifier,
        debounce: Duration,
    ) -> Self {
        let (display, _) = watch::channel(DisplayState::default());
        Self {
            inner: Arc::new(Inner {
                lookup,
                correction,
                notifier,
                debounce,
                state: Mutex::new(CoordinatorState {
                    active: QueryMode::default(),
                    word: Pipeline::default(),
                    sentence: Pipeline::default(),
                }),
                display,
            }),
        }
    }

    /// Records new input for `mode` and (re)starts its debounce timer.
    ///
    /// Blank input clears the mode's display right away without dispatching
    /// or consuming a sequence number. Input for an inactive mode is kept and
    /// dispatched once that mode becomes active.
    pub async fn on_input(&self, mode: QueryMode, text: &str) {
        let mut state = self.inner.state.lock().await;
        let active = state.active;
        let pipeline = state.pipeline_mut(mode);
        pipeline.input = text.to_string();
        pipeline.cancel_timer();

        if text.trim().is_empty() {
            pipeline.live = None;
            self.inner.clear_display(mode);
            return;
        }
        if mode == active {
            Inner::arm(&self.inner, pipeline, mode);
        }
    }

    /// Switches the visible mode.
    ///
    /// The mode being left loses its pending timer but keeps its in-flight
    /// request, whose response will be discarded. The newly active mode is
    /// re-armed with its current input.
    pub async fn set_active_mode(&self, mode: QueryMode) {
        let mut state = self.inner.state.lock().await;
        if state.active == mode {
            return;
        }
        let previous = state.active;
        state.active = mode;
        state.pipeline_mut(previous).cancel_timer();
        self.inner.display.send_modify(|display| display.active = mode);
        tracing::debug!(from = %previous, to = %mode, "Query mode switched");

        let pipeline = state.pipeline_mut(mode);
        pipeline.cancel_timer();
        if !pipeline.input.trim().is_empty() {
            Inner::arm(&self.inner, pipeline, mode);
        }
    }

    pub async fn active_mode(&self) -> QueryMode {
        self.inner.state.lock().await.active
    }

    /// Highest sequence number issued for `mode`.
    pub async fn issued_sequence(&self, mode: QueryMode) -> u64 {
        self.inner.state.lock().await.pipeline(mode).issued
    }

    pub fn display(&self) -> DisplayState {
        self.inner.display.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<DisplayState> {
        self.inner.display.subscribe()
    }

    pub fn notifier(&self) -> &Notifier {
        &self.inner.notifier
    }
}

impl Inner {
    fn arm(this: &Arc<Self>, pipeline: &mut Pipeline, mode: QueryMode) {
        let generation = pipeline.timer_generation;
        let inner = this.clone();
        pipeline.timer = Some(tokio::spawn(async move {
            tokio::time::sleep(inner.debounce).await;
            inner.fire(mode, generation).await;
        }));
    }

    async fn fire(self: Arc<Self>, mode: QueryMode, generation: u64) {
        let request = {
            let mut state = self.state.lock().await;
            let active = state.active;
            let pipeline = state.pipeline_mut(mode);
            if pipeline.timer_generation != generation {
                return;
            }
            // Nobody may abort this task once the request is issued.
            pipeline.timer = None;
            if active != mode || pipeline.input.trim().is_empty() {
                return;
            }
            pipeline.issued += 1;
            pipeline.live = Some(pipeline.issued);
            QueryRequest {
                mode,
                sequence: pipeline.issued,
                input_snapshot: pipeline.input.clone(),
                issued_at: Utc::now(),
            }
        };

        tracing::debug!(
            mode = %request.mode,
            sequence = request.sequence,
            "Dispatching query"
        );
        let response = self.dispatch(&request).await;
        self.resolve(request, response).await;
    }

    async fn dispatch(&self, request: &QueryRequest) -> Result<QueryResponse> {
        match request.mode {
            QueryMode::Word => self
                .lookup
                .lookup(&request.input_snapshot)
                .await
                .map(QueryResponse::Word),
            QueryMode::Sentence => self
                .correction
                .correct(&request.input_snapshot)
                .await
                .map(QueryResponse::Sentence),
        }
    }

    async fn resolve(&self, request: QueryRequest, response: Result<QueryResponse>) {
        let state = self.state.lock().await;
        let live = state.pipeline(request.mode).live;
        if live != Some(request.sequence) || state.active != request.mode {
            tracing::debug!(
                mode = %request.mode,
                sequence = request.sequence,
                live = ?live,
                active = %state.active,
                "Discarding stale query response"
            );
            return;
        }

        match response {
            Ok(QueryResponse::Word(result)) => {
                self.display.send_modify(|display| {
                    display.word = result;
                    display.word_query = request.input_snapshot.clone();
                });
            }
            Ok(QueryResponse::Sentence(corrected)) => {
                let corrected = if corrected.trim().is_empty() {
                    NO_CORRECTION_TEXT.to_string()
                } else {
                    corrected
                };
                self.display
                    .send_modify(|display| display.correction = corrected);
            }
            Err(e) => {
                tracing::warn!(
                    mode = %request.mode,
                    sequence = request.sequence,
                    error = %e,
                    "Query failed"
                );
                self.clear_display(request.mode);
                let message = match request.mode {
                    QueryMode::Word => "Word lookup failed.",
                    QueryMode::Sentence => "Grammar correction failed. Please try again later.",
                };
                self.notifier.notify(message);
            }
        }
    }

    fn clear_display(&self, mode: QueryMode) {
        self.display.send_modify(|display| match mode {
            QueryMode::Word => {
                display.word = WordResult::default();
                display.word_query.clear();
            }
            QueryMode::Sentence => display.correction.clear(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LexiError;
    use async_trait::async_trait;
    use std::sync::Mutex as StdMutex;
    use tokio::sync::oneshot;

    const DEBOUNCE: Duration = Duration::from_millis(500);

    /// Records every call and holds its answer until the test releases it.
    #[derive(Default)]
    struct GatedService {
        calls: StdMutex<Vec<String>>,
        pending: StdMutex<Vec<(String, oneshot::Sender<Result<String>>)>>,
    }

    impl GatedService {
        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }

        fn release(&self, input: &str, answer: Result<String>) {
            let mut pending = self.pending.lock().unwrap();
            let index = pending
                .iter()
                .position(|(i, _)| i == input)
                .expect("no pending call for input");
            let (_, tx) = pending.remove(index);
            let _ = tx.send(answer);
        }

        async fn wait(&self, input: &str) -> Result<String> {
            let (tx, rx) = oneshot::channel();
            self.calls.lock().unwrap().push(input.to_string());
            self.pending.lock().unwrap().push((input.to_string(), tx));
            rx.await
                .unwrap_or_else(|_| Err(LexiError::network("dropped")))
        }
    }

    #[async_trait]
    impl LookupService for GatedService {
        async fn lookup(&self, word: &str) -> Result<WordResult> {
            self.wait(word).await.map(|definition| WordResult {
                definitions: vec![definition],
                ..Default::default()
            })
        }
    }

    #[async_trait]
    impl CorrectionService for GatedService {
        async fn correct(&self, sentence: &str) -> Result<String> {
            self.wait(sentence).await
        }
    }

    fn coordinator() -> (QueryCoordinator, Arc<GatedService>, Arc<GatedService>) {
        let lookup = Arc::new(GatedService::default());
        let correction = Arc::new(GatedService::default());
        let coordinator = QueryCoordinator::new(
            lookup.clone(),
            correction.clone(),
            Notifier::new(Duration::from_millis(3000)),
            DEBOUNCE,
        );
        (coordinator, lookup, correction)
    }

    /// Lets spawned tasks run without moving the paused clock much.
    async fn settle() {
        tokio::time::sleep(Duration::from_millis(1)).await;
    }

    async fn type_and_fire(coordinator: &QueryCoordinator, mode: QueryMode, text: &str) {
        coordinator.on_input(mode, text).await;
        tokio::time::sleep(DEBOUNCE + Duration::from_millis(1)).await;
    }

    fn definitions(coordinator: &QueryCoordinator) -> Vec<String> {
        coordinator.display().word.definitions
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_input_dispatches_nothing() {
        let (coordinator, lookup, _) = coordinator();

        type_and_fire(&coordinator, QueryMode::Word, "").await;

        assert!(lookup.calls().is_empty());
        assert!(definitions(&coordinator).is_empty());
        assert_eq!(coordinator.issued_sequence(QueryMode::Word).await, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_typing_within_window_dispatches_once() {
        let (coordinator, lookup, _) = coordinator();

        coordinator.on_input(QueryMode::Word, "cat").await;
        tokio::time::sleep(Duration::from_millis(300)).await;
        coordinator.on_input(QueryMode::Word, "catalog").await;
        tokio::time::sleep(Duration::from_millis(499)).await;
        assert!(lookup.calls().is_empty());

        settle().await;
        settle().await;
        assert_eq!(lookup.calls(), vec!["catalog".to_string()]);
        assert_eq!(coordinator.issued_sequence(QueryMode::Word).await, 1);

        lookup.release("catalog", Ok("a list of items".to_string()));
        settle().await;
        assert_eq!(definitions(&coordinator), vec!["a list of items".to_string()]);
        assert_eq!(coordinator.display().word_query, "catalog");
    }

    #[tokio::test(start_paused = true)]
    async fn test_out_of_order_responses_keep_latest() {
        let (coordinator, lookup, _) = coordinator();

        type_and_fire(&coordinator, QueryMode::Word, "a").await;
        type_and_fire(&coordinator, QueryMode::Word, "ab").await;
        type_and_fire(&coordinator, QueryMode::Word, "abc").await;
        assert_eq!(lookup.calls(), vec!["a", "ab", "abc"]);
        assert_eq!(coordinator.issued_sequence(QueryMode::Word).await, 3);

        lookup.release("abc", Ok("third".to_string()));
        settle().await;
        lookup.release("a", Ok("first".to_string()));
        settle().await;
        lookup.release("ab", Ok("second".to_string()));
        settle().await;

        assert_eq!(definitions(&coordinator), vec!["third".to_string()]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_cat_response_after_catalog_is_ignored() {
        let (coordinator, lookup, _) = coordinator();

        type_and_fire(&coordinator, QueryMode::Word, "cat").await;
        type_and_fire(&coordinator, QueryMode::Word, "catalog").await;

        lookup.release("catalog", Ok("a list".to_string()));
        settle().await;
        lookup.release("cat", Ok("an animal".to_string()));
        settle().await;

        assert_eq!(definitions(&coordinator), vec!["a list".to_string()]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_clearing_input_discards_in_flight_response() {
        let (coordinator, lookup, _) = coordinator();

        type_and_fire(&coordinator, QueryMode::Word, "cat").await;
        coordinator.on_input(QueryMode::Word, "").await;
        lookup.release("cat", Ok("an animal".to_string()));
        settle().await;

        assert!(definitions(&coordinator).is_empty());
        assert_eq!(coordinator.issued_sequence(QueryMode::Word).await, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_mode_switch_suppresses_word_response() {
        let (coordinator, lookup, correction) = coordinator();

        type_and_fire(&coordinator, QueryMode::Word, "cat").await;
        coordinator.set_active_mode(QueryMode::Sentence).await;
        type_and_fire(&coordinator, QueryMode::Sentence, "he go home").await;
        correction.release("he go home", Ok("He goes home.".to_string()));
        settle().await;

        lookup.release("cat", Ok("an animal".to_string()));
        settle().await;

        let display = coordinator.display();
        assert_eq!(display.active, QueryMode::Sentence);
        assert_eq!(display.correction, "He goes home.");
        assert!(display.word.definitions.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_mode_switch_cancels_pending_timer_and_rearms_on_return() {
        let (coordinator, lookup, _) = coordinator();

        coordinator.on_input(QueryMode::Word, "cat").await;
        coordinator.set_active_mode(QueryMode::Sentence).await;
        tokio::time::sleep(DEBOUNCE * 2).await;
        assert!(lookup.calls().is_empty());

        coordinator.set_active_mode(QueryMode::Word).await;
        tokio::time::sleep(DEBOUNCE + Duration::from_millis(1)).await;
        assert_eq!(lookup.calls(), vec!["cat".to_string()]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_clears_display_and_notifies() {
        let (coordinator, lookup, _) = coordinator();

        type_and_fire(&coordinator, QueryMode::Word, "cat").await;
        lookup.release("cat", Ok("an animal".to_string()));
        settle().await;
        assert_eq!(definitions(&coordinator).len(), 1);

        type_and_fire(&coordinator, QueryMode::Word, "cats").await;
        lookup.release("cats", Err(LexiError::network("offline")));
        settle().await;

        assert!(definitions(&coordinator).is_empty());
        let notification = coordinator.notifier().current().unwrap();
        assert_eq!(notification.message, "Word lookup failed.");
        assert_eq!(coordinator.issued_sequence(QueryMode::Word).await, 2);

        tokio::time::sleep(Duration::from_millis(3001)).await;
        assert!(coordinator.notifier().current().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_in_one_mode_leaves_other_mode_alone() {
        let (coordinator, _, correction) = coordinator();

        coordinator.set_active_mode(QueryMode::Sentence).await;
        type_and_fire(&coordinator, QueryMode::Sentence, "he go").await;
        correction.release("he go", Ok("He goes.".to_string()));
        settle().await;

        coordinator.set_active_mode(QueryMode::Word).await;
        coordinator.set_active_mode(QueryMode::Sentence).await;
        tokio::time::sleep(DEBOUNCE + Duration::from_millis(1)).await;
        correction.release("he go", Err(LexiError::service(500, "boom")));
        settle().await;

        let display = coordinator.display();
        assert!(display.correction.is_empty());
        assert!(display.word.is_empty());
        assert_eq!(coordinator.issued_sequence(QueryMode::Word).await, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_correction_shows_placeholder() {
        let (coordinator, _, correction) = coordinator();

        coordinator.set_active_mode(QueryMode::Sentence).await;
        type_and_fire(&coordinator, QueryMode::Sentence, "He goes home.").await;
        correction.release("He goes home.", Ok(String::new()));
        settle().await;

        assert_eq!(coordinator.display().correction, NO_CORRECTION_TEXT);
    }
}
