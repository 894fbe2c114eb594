//! Job orchestration: validation, the concurrency cap, the active-jobs set
//! and result insertion.
//!
//! A job is accepted synchronously by [`JobOrchestrator::submit`], which
//! validates the request, captures the pixels and registers the job as
//! active. The returned [`JobTicket`] performs the network round trip when
//! run. The active entry lives in a drop guard owned by the ticket, so it
//! is removed on success, on error and when the task is dropped.

use crate::error::JobResult;
use crate::placement::place_result;
use crate::poll::poll_until_complete;
use crate::provider::{EditRequest, Provider, ProviderKind};
use crate::settings::JobSettings;
use canvasforge_capture::{ImageLoader, capture, decode_dimensions, encode_png, image_data_url};
use canvasforge_core::{Editor, ImageObject, ObjectId, ObjectRef, ValidationError};
use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Unique job identifier.
pub type JobId = Uuid;

/// What to send to which provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobRequest {
    /// Capture an image or frame and send it with its prompt.
    Edit { target: ObjectRef },
    /// Send a prompt only. With a target, the prompt is resolved from it
    /// and results are placed below it.
    Generate { target: Option<ObjectRef> },
}

impl JobRequest {
    pub fn kind(&self) -> ProviderKind {
        match self {
            JobRequest::Edit { .. } => ProviderKind::Edit,
            JobRequest::Generate { .. } => ProviderKind::Generate,
        }
    }

    pub fn target(&self) -> Option<ObjectRef> {
        match *self {
            JobRequest::Edit { target } => Some(target),
            JobRequest::Generate { target } => target,
        }
    }
}

/// A job in flight, for UI feedback.
#[derive(Debug, Clone, PartialEq)]
pub struct ActiveJob {
    pub id: JobId,
    pub kind: ProviderKind,
    /// Canvas the results will be inserted into.
    pub canvas_id: String,
    pub target: Option<ObjectRef>,
    pub prompt: String,
    pub started_at: Instant,
}

#[derive(Debug, Clone, PartialEq)]
pub enum NoticeKind {
    Completed { inserted: Vec<ObjectId> },
    Failed,
}

/// Outcome of a finished job, queued for the UI.
#[derive(Debug, Clone, PartialEq)]
pub struct JobNotice {
    pub job_id: JobId,
    pub kind: NoticeKind,
    /// Human-readable summary.
    pub message: String,
}

#[derive(Debug, Default)]
struct JobBoard {
    active: Vec<ActiveJob>,
    notices: VecDeque<JobNotice>,
}

/// Removes its job from the active set when dropped.
struct ActiveJobGuard {
    id: JobId,
    board: Rc<RefCell<JobBoard>>,
}

impl Drop for ActiveJobGuard {
    fn drop(&mut self) {
        match self.board.try_borrow_mut() {
            Ok(mut board) => board.active.retain(|job| job.id != self.id),
            Err(_) => error!(job_id = %self.id, "job board busy, active entry not released"),
        }
    }
}

/// Everything a job needs after it has been accepted.
struct JobPlan {
    prompt: String,
    canvas_id: String,
    target: Option<ObjectRef>,
    /// Encoded capture and its pixel size. Edit jobs only.
    upload: Option<(Vec<u8>, (u32, u32))>,
}

/// Process-wide job coordinator.
pub struct JobOrchestrator {
    editor: Rc<RefCell<Editor>>,
    provider: Rc<dyn Provider>,
    loader: Rc<dyn ImageLoader>,
    settings: JobSettings,
    board: Rc<RefCell<JobBoard>>,
}

impl JobOrchestrator {
    pub fn new(
        editor: Rc<RefCell<Editor>>,
        provider: Rc<dyn Provider>,
        loader: Rc<dyn ImageLoader>,
        settings: JobSettings,
    ) -> Self {
        Self {
            editor,
            provider,
            loader,
            settings,
            board: Rc::new(RefCell::new(JobBoard::default())),
        }
    }

    pub fn settings(&self) -> &JobSettings {
        &self.settings
    }

    /// Jobs currently in flight, oldest first.
    pub fn active_jobs(&self) -> Vec<ActiveJob> {
        self.board.borrow().active.clone()
    }

    pub fn active_count(&self) -> usize {
        self.board.borrow().active.len()
    }

    /// Whether a job for `target` is in flight.
    pub fn is_busy(&self, target: ObjectRef) -> bool {
        self.board
            .borrow()
            .active
            .iter()
            .any(|job| job.target == Some(target))
    }

    /// Take all queued notices.
    pub fn drain_notices(&self) -> Vec<JobNotice> {
        self.board.borrow_mut().notices.drain(..).collect()
    }

    /// Validate, capture and register a job.
    ///
    /// Every rejection happens here, before any network call and without
    /// touching the active set.
    pub fn submit(&self, request: JobRequest) -> JobResult<JobTicket> {
        if self.settings.api_key().is_none() {
            return Err(ValidationError::MissingApiKey.into());
        }
        let active = self.active_count();
        let limit = self.settings.max_concurrent_jobs;
        if active >= limit {
            return Err(ValidationError::ConcurrencyLimit { active, limit }.into());
        }

        let plan = self.plan(request)?;
        let id = Uuid::new_v4();
        self.board.borrow_mut().active.push(ActiveJob {
            id,
            kind: request.kind(),
            canvas_id: plan.canvas_id.clone(),
            target: plan.target,
            prompt: plan.prompt.clone(),
            started_at: Instant::now(),
        });
        info!(job_id = %id, kind = ?request.kind(), active = active + 1, "job accepted");

        Ok(JobTicket {
            id,
            plan,
            editor: Rc::clone(&self.editor),
            provider: Rc::clone(&self.provider),
            settings: self.settings.clone(),
            board: Rc::clone(&self.board),
            _guard: ActiveJobGuard {
                id,
                board: Rc::clone(&self.board),
            },
        })
    }

    fn plan(&self, request: JobRequest) -> JobResult<JobPlan> {
        let editor = self.editor.borrow();
        let canvas = editor.canvas();
        let target = request.target();

        if let Some(target) = target {
            if !target.can_own_prompt() {
                return Err(ValidationError::InvalidPromptTarget(target).into());
            }
            if !canvas.contains(target) {
                return Err(ValidationError::UnknownObject(target.id()).into());
            }
        }
        if let JobRequest::Edit {
            target: ObjectRef::Frame(frame_id),
        } = request
        {
            if canvas.frame_has_nested_prompt(frame_id) {
                return Err(ValidationError::NestedPromptConflict.into());
            }
        }

        let prompt = match target {
            Some(target) => editor.resolve_prompt(target)?,
            None => match editor.edit_prompt().trim() {
                "" => return Err(ValidationError::EmptyPrompt.into()),
                text => text.to_string(),
            },
        };

        let upload = match request {
            JobRequest::Edit { target } => {
                let pixels = capture(canvas, target, self.loader.as_ref())?;
                let png = encode_png(&pixels)?;
                Some((png, (pixels.width, pixels.height)))
            }
            JobRequest::Generate { .. } => None,
        };

        Ok(JobPlan {
            prompt,
            canvas_id: canvas.id.clone(),
            target,
            upload,
        })
    }

    /// Submit a job and run it as a local task.
    ///
    /// Must be called inside a `tokio::task::LocalSet`.
    pub fn dispatch(&self, request: JobRequest) -> JobResult<JobHandle> {
        let ticket = self.submit(request)?;
        let id = ticket.id();
        let task = tokio::task::spawn_local(ticket.run());
        Ok(JobHandle { id, task })
    }
}

/// A spawned job.
pub struct JobHandle {
    pub id: JobId,
    pub task: JoinHandle<JobResult<Vec<ObjectId>>>,
}

/// An accepted job that has not run yet. Dropping it releases its slot.
pub struct JobTicket {
    id: JobId,
    plan: JobPlan,
    editor: Rc<RefCell<Editor>>,
    provider: Rc<dyn Provider>,
    settings: JobSettings,
    board: Rc<RefCell<JobBoard>>,
    _guard: ActiveJobGuard,
}

impl JobTicket {
    pub fn id(&self) -> JobId {
        self.id
    }

    /// Upload, submit, poll, download and insert the results.
    /// Returns the ids of the inserted images.
    pub async fn run(mut self) -> JobResult<Vec<ObjectId>> {
        let result = self.execute().await;
        self.report(&result);
        result
    }

    async fn execute(&mut self) -> JobResult<Vec<ObjectId>> {
        let provider = Rc::clone(&self.provider);
        let request_id = match self.plan.upload.take() {
            Some((png, target_size)) => {
                let image_url = provider.upload_binary(png).await?;
                debug!(job_id = %self.id, %image_url, "capture uploaded");
                provider
                    .submit_edit(EditRequest {
                        image_url,
                        prompt: self.plan.prompt.clone(),
                        target_size,
                    })
                    .await?
            }
            None => provider.submit_generate(&self.plan.prompt).await?,
        };
        let submitted = Instant::now();
        info!(job_id = %self.id, %request_id, "submitted to provider");

        let urls = poll_until_complete(
            provider.as_ref(),
            &request_id,
            submitted,
            self.settings.poll_interval(),
            self.settings.poll_timeout(),
        )
        .await?;

        let mut results = Vec::with_capacity(urls.len());
        for url in &urls {
            let bytes = provider.download(url).await?;
            let size = decode_dimensions(&bytes)?;
            results.push((image_data_url(&bytes)?, size));
        }
        self.commit(results)
    }

    /// Insert results against the current editor state.
    fn commit(&self, results: Vec<(String, (u32, u32))>) -> JobResult<Vec<ObjectId>> {
        let mut editor = self.editor.borrow_mut();
        let source = self.plan.target.and_then(|target| {
            editor
                .collection()
                .get(&self.plan.canvas_id)
                .and_then(|canvas| canvas.bounds_of(target))
        });
        let view_center = editor.viewport().view_center();
        let settings = editor.settings().clone();

        let mut inserted = Vec::with_capacity(results.len());
        for (index, (src, size)) in results.into_iter().enumerate() {
            let rect = place_result(source, view_center, size, index, &settings);
            let image = ImageObject::new(src, rect.origin(), rect.width(), rect.height()).as_ai_result();
            inserted.push(editor.insert_image(&self.plan.canvas_id, image)?);
        }
        Ok(inserted)
    }

    fn report(&self, result: &JobResult<Vec<ObjectId>>) {
        let notice = match result {
            Ok(inserted) => {
                info!(job_id = %self.id, results = inserted.len(), "job completed");
                JobNotice {
                    job_id: self.id,
                    message: format!("Added {} result image(s)", inserted.len()),
                    kind: NoticeKind::Completed {
                        inserted: inserted.clone(),
                    },
                }
            }
            Err(e) => {
                warn!(job_id = %self.id, error = %e, "job failed");
                JobNotice {
                    job_id: self.id,
                    message: e.to_string(),
                    kind: NoticeKind::Failed,
                }
            }
        };
        self.board.borrow_mut().notices.push_back(notice);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::JobError;
    use crate::provider::{PollResponse, ProviderError, ProviderResult};
    use canvasforge_capture::{CaptureError, MemoryLoader, PixelBuffer};
    use canvasforge_core::storage::BoxFuture;
    use canvasforge_core::{ImportedImage, PointerButton, PointerEvent};
    use image::{Rgba, RgbaImage};
    use kurbo::{Point, Size};
    use std::time::Duration;

    fn result_png() -> Vec<u8> {
        encode_png(&PixelBuffer::from_image(RgbaImage::new(600, 300))).unwrap()
    }

    #[derive(Default)]
    struct FakeProvider {
        polls: RefCell<VecDeque<ProviderResult<PollResponse>>>,
        uploads: RefCell<Vec<Vec<u8>>>,
        edits: RefCell<Vec<EditRequest>>,
        generates: RefCell<Vec<String>>,
    }

    impl FakeProvider {
        fn new(polls: Vec<ProviderResult<PollResponse>>) -> Rc<Self> {
            Rc::new(Self {
                polls: RefCell::new(polls.into()),
                ..Self::default()
            })
        }

        fn completing() -> Rc<Self> {
            Self::new(vec![
                Ok(PollResponse::pending()),
                Ok(PollResponse::completed(vec!["https://out/1.png".into()])),
            ])
        }
    }

    impl Provider for FakeProvider {
        fn upload_binary(&self, png: Vec<u8>) -> BoxFuture<'_, ProviderResult<String>> {
            self.uploads.borrow_mut().push(png);
            Box::pin(async { Ok("https://cdn/capture.png".to_string()) })
        }

        fn submit_edit(&self, request: EditRequest) -> BoxFuture<'_, ProviderResult<String>> {
            self.edits.borrow_mut().push(request);
            Box::pin(async { Ok("req-edit".to_string()) })
        }

        fn submit_generate(&self, prompt: &str) -> BoxFuture<'_, ProviderResult<String>> {
            self.generates.borrow_mut().push(prompt.to_string());
            Box::pin(async { Ok("req-gen".to_string()) })
        }

        fn poll_result(&self, _request_id: &str) -> BoxFuture<'_, ProviderResult<PollResponse>> {
            Box::pin(async move {
                self.polls
                    .borrow_mut()
                    .pop_front()
                    .unwrap_or_else(|| Ok(PollResponse::pending()))
            })
        }

        fn download(&self, url: &str) -> BoxFuture<'_, ProviderResult<Vec<u8>>> {
            let known = url.starts_with("https://out/");
            Box::pin(async move {
                if known {
                    Ok(result_png())
                } else {
                    Err(ProviderError::Http {
                        status: 404,
                        message: "not found".into(),
                    })
                }
            })
        }
    }

    struct Fixture {
        editor: Rc<RefCell<Editor>>,
        orchestrator: JobOrchestrator,
        image: ObjectId,
    }

    fn fixture(provider: Rc<FakeProvider>, settings: JobSettings) -> Fixture {
        let mut editor = Editor::default();
        editor.set_viewport_bounds(Point::ZERO, Size::new(1000.0, 1000.0));
        editor.set_edit_prompt("make it blue");
        let canvas_id = editor.collection().active_id().to_string();
        let image = editor
            .insert_image(&canvas_id, ImageObject::new("red", Point::new(100.0, 100.0), 200.0, 100.0))
            .unwrap();

        let mut loader = MemoryLoader::new();
        loader.insert("red", RgbaImage::from_pixel(4, 4, Rgba([255, 0, 0, 255])));

        let editor = Rc::new(RefCell::new(editor));
        let orchestrator = JobOrchestrator::new(Rc::clone(&editor), provider, Rc::new(loader), settings);
        Fixture {
            editor,
            orchestrator,
            image,
        }
    }

    fn drag(editor: &mut Editor, from: Point, to: Point) {
        editor.handle_pointer(PointerEvent::Down {
            position: from,
            button: PointerButton::Primary,
            modifiers: Default::default(),
        });
        editor.handle_pointer(PointerEvent::Move { position: to });
        editor.handle_pointer(PointerEvent::Up { position: to });
    }

    fn click(editor: &mut Editor, at: Point) {
        drag(editor, at, at);
    }

    fn keyed() -> JobSettings {
        JobSettings::default().with_api_key("test-key")
    }

    #[tokio::test(start_paused = true)]
    async fn test_edit_job_inserts_result_below_source() {
        let provider = FakeProvider::completing();
        let fx = fixture(Rc::clone(&provider), keyed());

        let ticket = fx
            .orchestrator
            .submit(JobRequest::Edit {
                target: ObjectRef::Image(fx.image),
            })
            .unwrap();
        assert_eq!(fx.orchestrator.active_count(), 1);
        assert!(fx.orchestrator.is_busy(ObjectRef::Image(fx.image)));

        let inserted = ticket.run().await.unwrap();
        assert_eq!(inserted.len(), 1);
        assert_eq!(fx.orchestrator.active_count(), 0);

        let edits = provider.edits.borrow();
        assert_eq!(edits[0].prompt, "make it blue");
        assert_eq!(edits[0].target_size, (200, 100));
        assert_eq!(provider.uploads.borrow().len(), 1);

        let editor = fx.editor.borrow();
        let result = editor.canvas().image(inserted[0]).unwrap();
        assert!(result.is_ai_result);
        assert!(result.src.starts_with("data:image/png;base64,"));
        assert_eq!(result.position, Point::new(50.0, 250.0));
        assert_eq!((result.width, result.height), (300.0, 150.0));
        let source_z = editor.canvas().image(fx.image).unwrap().z_index;
        assert!(result.z_index > source_z);

        let notices = fx.orchestrator.drain_notices();
        assert_eq!(notices.len(), 1);
        assert!(matches!(notices[0].kind, NoticeKind::Completed { .. }));
        assert!(fx.orchestrator.drain_notices().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_prompt_node_text_is_sent() {
        let provider = FakeProvider::completing();
        let fx = fixture(Rc::clone(&provider), keyed());
        {
            let mut editor = fx.editor.borrow_mut();
            click(&mut editor, Point::new(150.0, 150.0));
            let node = editor.add_prompt_node().unwrap();
            editor.set_prompt(node, "turn into a watercolor").unwrap();
        }
        let ticket = fx
            .orchestrator
            .submit(JobRequest::Edit {
                target: ObjectRef::Image(fx.image),
            })
            .unwrap();
        ticket.run().await.unwrap();
        assert_eq!(provider.edits.borrow()[0].prompt, "turn into a watercolor");
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrency_cap_rejects_without_side_effects() {
        let fx = fixture(FakeProvider::new(vec![]), keyed());
        let tickets: Vec<JobTicket> = (0..10)
            .map(|_| {
                fx.orchestrator
                    .submit(JobRequest::Generate { target: None })
                    .unwrap()
            })
            .collect();
        assert_eq!(fx.orchestrator.active_count(), 10);
        let before = fx.orchestrator.active_jobs();

        for _ in 10..20 {
            let err = fx
                .orchestrator
                .submit(JobRequest::Generate { target: None })
                .err()
                .unwrap();
            assert_eq!(
                err,
                JobError::Validation(ValidationError::ConcurrencyLimit { active: 10, limit: 10 })
            );
        }
        assert_eq!(fx.orchestrator.active_jobs(), before);

        drop(tickets);
        assert_eq!(fx.orchestrator.active_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_status_is_terminal_and_cleans_up() {
        let provider = FakeProvider::new(vec![Ok(PollResponse::failed("content policy"))]);
        let fx = fixture(provider, keyed());
        let started = Instant::now();

        let ticket = fx
            .orchestrator
            .submit(JobRequest::Edit {
                target: ObjectRef::Image(fx.image),
            })
            .unwrap();
        let err = ticket.run().await.unwrap_err();
        assert_eq!(err, JobError::Provider(ProviderError::Failed("content policy".into())));
        assert!(started.elapsed() < Duration::from_secs(10));

        assert_eq!(fx.orchestrator.active_count(), 0);
        assert_eq!(fx.editor.borrow().canvas().len(), 1);
        let notices = fx.orchestrator.drain_notices();
        assert_eq!(notices[0].kind, NoticeKind::Failed);
        assert!(notices[0].message.contains("content policy"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_is_distinct_from_provider_error() {
        let fx = fixture(FakeProvider::new(vec![]), keyed());
        let ticket = fx
            .orchestrator
            .submit(JobRequest::Generate { target: None })
            .unwrap();
        let err = ticket.run().await.unwrap_err();
        assert!(matches!(err, JobError::Timeout { elapsed } if elapsed >= Duration::from_secs(180)));
        assert_eq!(fx.orchestrator.active_count(), 0);
        assert!(fx.orchestrator.drain_notices()[0].message.contains("did not finish"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_download_failure_inserts_nothing() {
        let provider = FakeProvider::new(vec![Ok(PollResponse::completed(vec!["https://gone/x.png".into()]))]);
        let fx = fixture(provider, keyed());
        let ticket = fx
            .orchestrator
            .submit(JobRequest::Generate { target: None })
            .unwrap();
        assert!(matches!(ticket.run().await, Err(JobError::Provider(ProviderError::Http { status: 404, .. }))));
        assert_eq!(fx.editor.borrow().canvas().len(), 1);
        assert_eq!(fx.orchestrator.active_count(), 0);
    }

    #[test]
    fn test_validation_rejections_never_register() {
        let fx = fixture(FakeProvider::new(vec![]), JobSettings::default());
        let edit = JobRequest::Edit {
            target: ObjectRef::Image(fx.image),
        };
        assert_eq!(
            fx.orchestrator.submit(edit).err(),
            Some(JobError::Validation(ValidationError::MissingApiKey))
        );

        let fx = fixture(FakeProvider::new(vec![]), keyed());
        fx.editor.borrow_mut().set_edit_prompt("   ");
        assert_eq!(
            fx.orchestrator.submit(edit).err(),
            Some(JobError::Validation(ValidationError::EmptyPrompt))
        );
        assert_eq!(
            fx.orchestrator.submit(JobRequest::Generate { target: None }).err(),
            Some(JobError::Validation(ValidationError::EmptyPrompt))
        );
        assert_eq!(fx.orchestrator.active_count(), 0);
    }

    #[test]
    fn test_nested_prompt_conflict() {
        let fx = fixture(FakeProvider::new(vec![]), keyed());
        let (frame, node) = {
            let mut editor = fx.editor.borrow_mut();
            editor.set_viewport_bounds(Point::ZERO, Size::new(400.0, 300.0));
            // Frame centered on (200, 150) covers the image at (100, 100).
            let frame = editor.add_frame("1:1").unwrap();
            click(&mut editor, Point::new(150.0, 150.0));
            (frame, editor.add_prompt_node().unwrap())
        };
        assert_eq!(
            fx.orchestrator
                .submit(JobRequest::Edit {
                    target: ObjectRef::Frame(frame),
                })
                .err(),
            Some(JobError::Validation(ValidationError::NestedPromptConflict))
        );
        assert_eq!(
            fx.orchestrator
                .submit(JobRequest::Edit {
                    target: ObjectRef::PromptNode(node),
                })
                .err(),
            Some(JobError::Validation(ValidationError::InvalidPromptTarget(ObjectRef::PromptNode(node))))
        );
        assert_eq!(fx.orchestrator.active_count(), 0);
    }

    #[test]
    fn test_capture_failure_rejects_before_start() {
        let fx = fixture(FakeProvider::new(vec![]), keyed());
        let broken = {
            let mut editor = fx.editor.borrow_mut();
            let ids = editor.import_images(&[ImportedImage::new("missing.png", 50.0, 50.0)]);
            ids[0]
        };
        let err = fx
            .orchestrator
            .submit(JobRequest::Edit {
                target: ObjectRef::Image(broken),
            })
            .err()
            .unwrap();
        assert!(matches!(err, JobError::Capture(CaptureError::Load { .. })));
        assert_eq!(fx.orchestrator.active_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_generate_without_target_centers_in_view() {
        let provider = FakeProvider::completing();
        let fx = fixture(Rc::clone(&provider), keyed());
        let inserted = fx
            .orchestrator
            .submit(JobRequest::Generate { target: None })
            .unwrap()
            .run()
            .await
            .unwrap();
        assert_eq!(provider.generates.borrow().as_slice(), ["make it blue".to_string()]);
        assert!(provider.uploads.borrow().is_empty());

        let editor = fx.editor.borrow();
        let result = editor.canvas().image(inserted[0]).unwrap();
        assert_eq!(result.center(), Point::new(500.0, 500.0));
    }

    #[tokio::test(start_paused = true)]
    async fn test_results_commit_against_latest_state() {
        let provider = FakeProvider::completing();
        let fx = fixture(provider, keyed());
        let original_canvas = fx.editor.borrow().collection().active_id().to_string();

        let local = tokio::task::LocalSet::new();
        local
            .run_until(async {
                let handle = fx
                    .orchestrator
                    .dispatch(JobRequest::Edit {
                        target: ObjectRef::Image(fx.image),
                    })
                    .unwrap();
                assert_eq!(fx.orchestrator.active_count(), 1);

                // The user keeps working while the job is in flight.
                {
                    let mut editor = fx.editor.borrow_mut();
                    editor.create_canvas(Some("Elsewhere"));
                    editor.select_canvas(&original_canvas).unwrap();
                    drag(&mut editor, Point::new(150.0, 150.0), Point::new(1050.0, 1050.0));
                    editor.create_canvas(Some("Active elsewhere"));
                }

                let inserted = handle.task.await.unwrap().unwrap();
                assert_eq!(fx.orchestrator.active_count(), 0);

                let editor = fx.editor.borrow();
                assert!(editor.canvas().image(inserted[0]).is_none());
                let canvas = editor.collection().get(&original_canvas).unwrap();
                let source = canvas.image(fx.image).unwrap();
                assert_eq!(source.position, Point::new(1000.0, 1000.0));
                let result = canvas.image(inserted[0]).unwrap();
                assert_eq!(result.position, Point::new(950.0, 1150.0));
            })
            .await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_frame_capture_sizes_upload() {
        let provider = FakeProvider::completing();
        let fx = fixture(Rc::clone(&provider), keyed());
        let frame = fx.editor.borrow_mut().add_frame("16:9").unwrap();
        let ticket = fx
            .orchestrator
            .submit(JobRequest::Edit {
                target: ObjectRef::Frame(frame),
            })
            .unwrap();
        let frame_obj = fx.editor.borrow().canvas().frame(frame).cloned().unwrap();
        assert_eq!(
            ticket.plan.upload.as_ref().map(|(_, size)| *size),
            Some((frame_obj.width.round() as u32, frame_obj.height.round() as u32))
        );
    }
}
