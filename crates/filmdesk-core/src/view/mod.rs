//! The catalog screen: movie list, add/edit form and notifications.
//!
//! [`CatalogController`] is the only place user actions meet the repository.
//! Every operation catches its own failures and turns them into a
//! [`Notification`], so nothing escapes to the caller as an error.

pub mod form;
pub mod list;
pub mod notify;

use tracing::{debug, warn};

use crate::error::ApiError;
use crate::repository::MovieRepository;
use crate::types::MovieId;

pub use form::{FormMode, MovieForm};
pub use list::ListView;
pub use notify::{Notification, NotificationKind};

const SESSION_EXPIRED: &str = "Your session has expired. Please log in again.";

/// Receives state changes as they happen, e.g. to draw a spinner while the
/// list is loading.
pub trait ViewRenderer: Send {
    fn render_list(&mut self, view: &ListView);
    fn render_notification(&mut self, notification: &Notification);
}

/// Renderer that draws nothing.
pub struct NullRenderer;

impl ViewRenderer for NullRenderer {
    fn render_list(&mut self, _view: &ListView) {}
    fn render_notification(&mut self, _notification: &Notification) {}
}

pub struct CatalogController {
    repo: MovieRepository,
    renderer: Box<dyn ViewRenderer>,
    list: ListView,
    form: Option<MovieForm>,
    notification: Option<Notification>,
    needs_login: bool,
}

impl CatalogController {
    pub fn new(repo: MovieRepository) -> Self {
        Self::with_renderer(repo, Box::new(NullRenderer))
    }

    pub fn with_renderer(repo: MovieRepository, renderer: Box<dyn ViewRenderer>) -> Self {
        Self {
            repo,
            renderer,
            list: ListView::Loading,
            form: None,
            notification: None,
            needs_login: false,
        }
    }

    pub fn list(&self) -> &ListView {
        &self.list
    }

    pub fn form(&self) -> Option<&MovieForm> {
        self.form.as_ref()
    }

    pub fn form_mut(&mut self) -> Option<&mut MovieForm> {
        self.form.as_mut()
    }

    pub fn notification(&self) -> Option<&Notification> {
        self.notification.as_ref()
    }

    /// Set once any call was rejected with 401; the session is gone by then.
    pub fn needs_login(&self) -> bool {
        self.needs_login
    }

    /// Refetch the list: Loading, then Populated, Empty or Error.
    pub async fn refresh(&mut self) {
        self.set_list(ListView::Loading);
        match self.repo.list().await {
            Ok(movies) => self.set_list(ListView::loaded(movies)),
            Err(e) => {
                let message = self.describe("Failed to load movies", &e);
                self.set_list(ListView::Error(message.clone()));
                self.notify(Notification::error(message));
            }
        }
    }

    /// Open the form: empty without an id, prefilled from the server with one.
    pub async fn open_form(&mut self, id: Option<MovieId>) {
        let Some(id) = id else {
            self.form = Some(MovieForm::create());
            return;
        };

        match self.repo.get(&id).await {
            Ok(movie) => self.form = Some(MovieForm::edit(&movie)),
            Err(e) => {
                let message = self.describe("Failed to load the movie", &e);
                self.notify(Notification::error(message));
            }
        }
    }

    pub fn close_form(&mut self) {
        self.form = None;
    }

    /// Validate and save the open form. Returns whether the save went through.
    ///
    /// On success the form closes and the list is refetched. Validation
    /// failures send nothing and leave the form as it was.
    pub async fn submit_form(&mut self) -> bool {
        let Some(form) = self.form.as_ref() else {
            return false;
        };

        let draft = match form.validate() {
            Ok(draft) => draft,
            Err(e) => {
                debug!("Form rejected: {}", e);
                self.notify(Notification::error(e.to_string()));
                return false;
            }
        };

        let mode = form.mode().clone();
        let saved = match &mode {
            FormMode::Create => self.repo.create(&draft).await.map(|_| ()),
            FormMode::Edit(id) => self.repo.update(id, &draft).await.map(|_| ()),
        };

        if let Err(e) = saved {
            let message = self.describe("Failed to save the movie", &e);
            self.notify(Notification::error(message));
            return false;
        }

        self.form = None;
        self.refresh().await;
        if !matches!(self.list, ListView::Error(_)) {
            self.notify(Notification::success(match mode {
                FormMode::Create => "Movie added.",
                FormMode::Edit(_) => "Movie updated.",
            }));
        }
        true
    }

    /// Delete a movie once the user confirmed. Returns whether it was deleted.
    pub async fn delete(&mut self, id: &MovieId, confirmed: bool) -> bool {
        if !confirmed {
            return false;
        }

        if let Err(e) = self.repo.delete(id).await {
            let message = self.describe("Failed to delete the movie", &e);
            self.notify(Notification::error(message));
            return false;
        }

        self.refresh().await;
        if !matches!(self.list, ListView::Error(_)) {
            self.notify(Notification::success("Movie deleted."));
        }
        true
    }

    fn set_list(&mut self, view: ListView) {
        self.list = view;
        self.renderer.render_list(&self.list);
    }

    fn notify(&mut self, notification: Notification) {
        self.renderer.render_notification(&notification);
        self.notification = Some(notification);
    }

    fn describe(&mut self, context: &str, err: &ApiError) -> String {
        if matches!(err, ApiError::Unauthorized) {
            self.needs_login = true;
            return SESSION_EXPIRED.to_string();
        }
        warn!("{}: {}", context, err);
        format!("{context}: {err}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::tests::{CountingStore, ScriptedTransport};
    use crate::gateway::{ApiResponse, Gateway, RecordingRedirect};
    use reqwest::{Method, Url};
    use serde_json::json;
    use std::sync::atomic::Ordering;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct Recorder {
        lists: Arc<Mutex<Vec<ListView>>>,
        notes: Arc<Mutex<Vec<Notification>>>,
    }

    impl ViewRenderer for Recorder {
        fn render_list(&mut self, view: &ListView) {
            self.lists.lock().unwrap().push(view.clone());
        }

        fn render_notification(&mut self, notification: &Notification) {
            self.notes.lock().unwrap().push(notification.clone());
        }
    }

    struct Harness {
        ctl: CatalogController,
        transport: Arc<ScriptedTransport>,
        store: Arc<CountingStore>,
        redirect: Arc<RecordingRedirect>,
        recorder: Recorder,
    }

    fn harness(responses: Vec<ApiResponse>) -> Harness {
        let transport = Arc::new(ScriptedTransport::new(responses));
        let store = Arc::new(CountingStore::with_session("tok", "sari"));
        let redirect = Arc::new(RecordingRedirect::new());
        let gateway = Gateway::new(
            transport.clone(),
            store.clone(),
            Url::parse("http://localhost:8080/api").unwrap(),
            redirect.clone(),
        );
        let recorder = Recorder::default();
        let ctl = CatalogController::with_renderer(
            MovieRepository::new(Arc::new(gateway)),
            Box::new(recorder.clone()),
        );
        Harness {
            ctl,
            transport,
            store,
            redirect,
            recorder,
        }
    }

    fn movie(id: i64, title: &str) -> serde_json::Value {
        json!({
            "id": id,
            "title": title,
            "genre": "Drama",
            "releaseYear": 2001,
            "director": "Someone",
            "cast": ["A", "B"]
        })
    }

    fn ok(body: serde_json::Value) -> ApiResponse {
        ApiResponse::new(200, body.to_string())
    }

    fn fill(form: &mut MovieForm, year: &str) {
        form.title = "Ada Apa Dengan Cinta?".into();
        form.genre = "Romance".into();
        form.year = year.into();
        form.director = "Rudi Soedjarwo".into();
        form.cast = "Dian Sastrowardoyo, Nicholas Saputra".into();
    }

    #[tokio::test]
    async fn test_refresh_transitions() {
        let mut h = harness(vec![ok(json!([movie(1, "X")])), ok(json!([])), ApiResponse::new(500, "")]);

        h.ctl.refresh().await;
        assert_eq!(h.ctl.list().movies().len(), 1);
        h.ctl.refresh().await;
        assert_eq!(h.ctl.list(), &ListView::Empty);
        h.ctl.refresh().await;
        assert!(matches!(h.ctl.list(), ListView::Error(m) if m.contains("HTTP error! status: 500")));

        let lists = h.recorder.lists.lock().unwrap().clone();
        assert_eq!(lists.len(), 6);
        for pair in lists.chunks(2) {
            assert!(pair[0].is_loading());
            assert!(!pair[1].is_loading());
        }
        assert!(h.ctl.notification().unwrap().is_error());
    }

    #[tokio::test]
    async fn test_open_form_modes() {
        let mut h = harness(vec![ok(movie(4, "Petualangan Sherina"))]);

        h.ctl.open_form(None).await;
        assert_eq!(h.ctl.form().unwrap().mode(), &FormMode::Create);
        assert!(h.ctl.form().unwrap().title.is_empty());

        h.ctl.open_form(Some(MovieId::Number(4))).await;
        let form = h.ctl.form().unwrap();
        assert_eq!(form.mode(), &FormMode::Edit(MovieId::Number(4)));
        assert_eq!(form.title, "Petualangan Sherina");
        assert_eq!(form.cast, "A, B");
    }

    #[tokio::test]
    async fn test_invalid_year_sends_nothing() {
        let mut h = harness(vec![]);
        h.ctl.open_form(None).await;
        for year in ["1899", "2031"] {
            fill(h.ctl.form_mut().unwrap(), year);
            assert!(!h.ctl.submit_form().await);
        }

        assert!(h.transport.requests().is_empty());
        assert!(h.ctl.form().is_some());
        assert!(h.ctl.list().is_loading());
        assert!(h.recorder.lists.lock().unwrap().is_empty());
        let note = h.ctl.notification().unwrap();
        assert!(note.is_error());
        assert!(note.message.contains("2031"));
    }

    #[tokio::test]
    async fn test_create_then_refetch() {
        let mut h = harness(vec![
            ApiResponse::new(201, movie(9, "Ada Apa Dengan Cinta?").to_string()),
            ok(json!({ "data": [movie(9, "Ada Apa Dengan Cinta?")] })),
        ]);
        h.ctl.open_form(None).await;
        fill(h.ctl.form_mut().unwrap(), "2002");
        assert!(h.ctl.submit_form().await);

        let requests = h.transport.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].method, Method::POST);
        assert_eq!(requests[1].method, Method::GET);

        assert!(h.ctl.form().is_none());
        assert_eq!(h.ctl.list().movies().len(), 1);
        assert_eq!(
            h.ctl.notification(),
            Some(&Notification::success("Movie added."))
        );
    }

    #[tokio::test]
    async fn test_failed_save_keeps_form_and_skips_refetch() {
        let mut h = harness(vec![ApiResponse::new(422, r#"{"message":"Title already exists"}"#)]);
        h.ctl.open_form(None).await;
        fill(h.ctl.form_mut().unwrap(), "2002");
        assert!(!h.ctl.submit_form().await);

        assert_eq!(h.transport.requests().len(), 1);
        assert!(h.ctl.form().is_some());
        assert_eq!(
            h.ctl.notification().unwrap().message,
            "Failed to save the movie: Title already exists"
        );
    }

    #[tokio::test]
    async fn test_edit_submits_put() {
        let mut h = harness(vec![
            ok(movie(4, "Old")),
            ApiResponse::new(204, ""),
            ok(json!([movie(4, "New")])),
        ]);
        h.ctl.open_form(Some(MovieId::Number(4))).await;
        h.ctl.form_mut().unwrap().title = "New".into();
        assert!(h.ctl.submit_form().await);

        let put = h.transport.requests().remove(1);
        assert_eq!(put.method, Method::PUT);
        assert_eq!(put.url.path(), "/api/movies/4");
        assert_eq!(h.ctl.list().movies()[0].title, "New");
        assert_eq!(h.ctl.notification().unwrap().message, "Movie updated.");
    }

    #[tokio::test]
    async fn test_delete_twice() {
        let mut h = harness(vec![
            ApiResponse::new(200, ""),
            ok(json!([])),
            ApiResponse::new(404, r#"{"message":"Movie not found"}"#),
        ]);
        let id = MovieId::Number(2);

        assert!(h.ctl.delete(&id, true).await);
        assert_eq!(h.ctl.list(), &ListView::Empty);
        assert_eq!(h.ctl.notification().unwrap().message, "Movie deleted.");

        assert!(!h.ctl.delete(&id, true).await);
        let note = h.ctl.notification().unwrap();
        assert!(note.is_error());
        assert_eq!(note.message, "Failed to delete the movie: Movie not found");
        assert_eq!(h.ctl.list(), &ListView::Empty);
    }

    #[tokio::test]
    async fn test_unconfirmed_delete_does_nothing() {
        let mut h = harness(vec![]);
        assert!(!h.ctl.delete(&MovieId::Number(1), false).await);
        assert!(h.transport.requests().is_empty());
        assert!(h.ctl.notification().is_none());
    }

    #[tokio::test]
    async fn test_401_flags_login_and_tears_down_once() {
        let mut h = harness(vec![ApiResponse::new(401, "")]);
        h.ctl.refresh().await;

        assert!(h.ctl.needs_login());
        assert_eq!(h.store.clears.load(Ordering::SeqCst), 1);
        assert_eq!(h.redirect.count(), 1);
        assert_eq!(h.ctl.notification().unwrap().message, SESSION_EXPIRED);
        assert_eq!(h.recorder.notes.lock().unwrap().len(), 1);
    }
}
