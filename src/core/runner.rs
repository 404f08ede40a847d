use crate::core::error::{HostError, WizardError};
use crate::core::host::{ChoiceOutcome, ChoiceView, Host, TextEvent, TextStatus, TextView};
use crate::core::prompt::{InputBox, QuickPick, QuickPickItem, ShouldResume, Validate};
use crate::core::step::{Interrupt, StepRef, Transition};
use crate::core::validation::{Ticket, ValidationGate, Verdict};
use futures::future::BoxFuture;
use futures::stream::{FuturesUnordered, StreamExt};
use tracing::{debug, info, trace};

/// Drives a chain of steps against a [`Host`].
pub struct WizardRunner<H> {
    host: H,
    name: String,
}

impl<H: Host> WizardRunner<H> {
    pub fn new(host: H) -> Self {
        Self {
            host,
            name: "wizard".to_string(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn into_host(self) -> H {
        self.host
    }

    /// Runs `first` and its continuations against `state` until a step
    /// returns [`Transition::Done`]. A dismissed prompt whose
    /// `should_resume` does not ask to retry ends the run with
    /// [`WizardError::Cancelled`].
    pub async fn run<S: Send>(
        &mut self,
        first: StepRef<S>,
        mut state: S,
    ) -> Result<S, WizardError> {
        let mut frames: Vec<StepRef<S>> = Vec::new();
        let mut next = Some(first);

        while let Some(step) = next.take() {
            frames.push(step.clone());
            let depth = frames.len();
            debug!(wizard = %self.name, depth, step = step.name(), "running step");

            let mut input = StepInput {
                host: &mut self.host,
                depth,
            };
            match step.run(&mut input, &mut state).await {
                Ok(Transition::Next(following)) => next = Some(following),
                Ok(Transition::Done) => {
                    info!(wizard = %self.name, depth, "wizard completed");
                }
                Err(Interrupt::Back) => {
                    frames.pop();
                    next = match frames.pop() {
                        Some(previous) => Some(previous),
                        None => Some(step),
                    };
                    info!(wizard = %self.name, depth, "navigating back");
                }
                Err(Interrupt::Resume) => {
                    frames.pop();
                    info!(wizard = %self.name, depth, "resuming dismissed step");
                    next = Some(step);
                }
                Err(Interrupt::Cancel) => {
                    info!(wizard = %self.name, depth, "wizard cancelled");
                    return Err(WizardError::Cancelled);
                }
                Err(Interrupt::Failed(error)) => {
                    debug!(wizard = %self.name, depth, %error, "wizard failed");
                    return Err(error);
                }
            }
        }

        Ok(state)
    }
}

/// Prompt handle passed to the running step.
pub struct StepInput<'a> {
    host: &'a mut dyn Host,
    depth: usize,
}

type PendingValidation = BoxFuture<'static, (Ticket, Option<String>)>;

impl StepInput<'_> {
    /// Position of the running step on the frame stack, starting at 1.
    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn can_go_back(&self) -> bool {
        self.depth > 1
    }

    pub async fn show_quick_pick(&mut self, pick: &QuickPick) -> Result<QuickPickItem, Interrupt> {
        pick.check()?;
        let view = ChoiceView {
            title: &pick.title,
            indicator: pick.indicator,
            placeholder: pick.placeholder.as_deref(),
            items: &pick.items,
            active: pick.active_index(),
            can_go_back: self.can_go_back(),
        };

        loop {
            match self.host.present_choice(&view).await? {
                ChoiceOutcome::Picked(index) => {
                    let Some(item) = pick.items.get(index).cloned() else {
                        return Err(HostError::ChoiceOutOfRange {
                            index,
                            len: pick.items.len(),
                        }
                        .into());
                    };
                    trace!(step = %pick.indicator, label = %item.label, "picked");
                    return Ok(item);
                }
                ChoiceOutcome::Back if self.can_go_back() => return Err(Interrupt::Back),
                ChoiceOutcome::Back => debug!("back ignored on first step"),
                ChoiceOutcome::Dismissed => {
                    return Err(dismissed(pick.should_resume.as_ref()).await);
                }
            }
        }
    }

    pub async fn show_input_box(&mut self, input: &InputBox) -> Result<String, Interrupt> {
        input.check()?;
        let view = TextView {
            title: &input.title,
            indicator: input.indicator,
            prompt: input.prompt.as_deref(),
            value: &input.value,
            can_go_back: self.can_go_back(),
        };
        self.host.open_text_input(&view).await?;

        let outcome = self.drive_input_box(input).await;
        let closed = self.host.close_text_input().await;
        let value = outcome?;
        closed?;
        Ok(value)
    }

    async fn drive_input_box(&mut self, input: &InputBox) -> Result<String, Interrupt> {
        let mut gate = ValidationGate::new();
        let mut in_flight: FuturesUnordered<PendingValidation> = FuturesUnordered::new();
        let mut accepting: Option<String> = None;

        loop {
            tokio::select! {
                // Input is held while an accepted value is still being validated.
                event = self.host.next_text_event(), if accepting.is_none() => match event? {
                    TextEvent::Changed(text) => {
                        accepting = None;
                        if let Some(validate) = &input.validate {
                            in_flight.push(start_validation(&mut gate, validate, text));
                        }
                    }
                    TextEvent::Accept(text) => {
                        let Some(validate) = &input.validate else {
                            return Ok(text);
                        };
                        if gate.verdict_for(&text) == Some(Verdict::Valid) {
                            return Ok(text);
                        }
                        // Rejected text is checked again on every accept.
                        if !gate.is_pending_for(&text) {
                            let pending = start_validation(&mut gate, validate, text.clone());
                            in_flight.push(pending);
                        }
                        self.host.show_validation(TextStatus::Pending).await?;
                        accepting = Some(text);
                    }
                    TextEvent::Back => {
                        if self.can_go_back() {
                            return Err(Interrupt::Back);
                        }
                        debug!("back ignored on first step");
                    }
                    TextEvent::Dismissed => {
                        return Err(dismissed(input.should_resume.as_ref()).await);
                    }
                },
                Some((ticket, outcome)) = in_flight.next(), if !in_flight.is_empty() => {
                    if !gate.settle(ticket, outcome) {
                        trace!("discarding superseded validation");
                        continue;
                    }
                    if let Some(text) = accepting.take()
                        && gate.verdict_for(&text) == Some(Verdict::Valid)
                    {
                        return Ok(text);
                    }
                    let status = match gate.message() {
                        Some(message) => TextStatus::Error(message),
                        None => TextStatus::Clear,
                    };
                    self.host.show_validation(status).await?;
                }
                else => accepting = None,
            }
        }
    }
}

fn start_validation(
    gate: &mut ValidationGate,
    validate: &Validate,
    text: String,
) -> PendingValidation {
    let ticket = gate.issue(&text);
    let check = validate(text);
    Box::pin(async move { (ticket, check.await) })
}

async fn dismissed(should_resume: Option<&ShouldResume>) -> Interrupt {
    match should_resume {
        Some(predicate) if predicate().await => Interrupt::Resume,
        _ => Interrupt::Cancel,
    }
}

#[cfg(test)]
mod tests {
    use super::{StepInput, WizardRunner};
    use crate::core::error::{HostError, WizardError};
    use crate::core::prompt::{
        InputBox, QuickPick, QuickPickItem, Validate, resume_always, resume_never, validator,
    };
    use crate::core::step::{Step, StepResult, Transition};
    use crate::testing::{Scripted, ScriptedHost, Shown};
    use async_trait::async_trait;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[derive(Debug, Default)]
    struct Trail {
        visited: Vec<&'static str>,
        target: Option<String>,
        port: Option<String>,
        kind: Option<String>,
    }

    fn port_check() -> Validate {
        validator(|value: String| async move {
            tokio::time::sleep(Duration::from_millis(300)).await;
            match value.parse::<u32>() {
                Ok(port) if (1..=65535).contains(&port) => None,
                _ => Some("port must be 1..65535".to_string()),
            }
        })
    }

    struct PickTarget {
        resume: bool,
    }

    #[async_trait]
    impl Step<Trail> for PickTarget {
        async fn run(&self, input: &mut StepInput<'_>, state: &mut Trail) -> StepResult<Trail> {
            state.visited.push("target");
            let pick = QuickPick::new("target", 1, 3)
                .with_items(QuickPickItem::from_labels(["x", "y"]))
                .with_active_item(state.target.as_deref());
            state.target = Some(input.show_quick_pick(&pick).await?.label);
            Ok(Transition::next(EnterPort {
                resume: self.resume,
            }))
        }
    }

    struct EnterPort {
        resume: bool,
    }

    #[async_trait]
    impl Step<Trail> for EnterPort {
        async fn run(&self, input: &mut StepInput<'_>, state: &mut Trail) -> StepResult<Trail> {
            state.visited.push("port");
            let resume = if self.resume {
                resume_always()
            } else {
                resume_never()
            };
            let prompt = InputBox::new("port", 2, 3)
                .with_value(state.port.clone().unwrap_or_default())
                .with_validate(port_check())
                .with_should_resume(resume);
            state.port = Some(input.show_input_box(&prompt).await?);
            Ok(Transition::next(PickKind))
        }
    }

    struct PickKind;

    #[async_trait]
    impl Step<Trail> for PickKind {
        async fn run(&self, input: &mut StepInput<'_>, state: &mut Trail) -> StepResult<Trail> {
            state.visited.push("kind");
            let pick = QuickPick::new("kind", 3, 3)
                .with_items(QuickPickItem::from_labels(["helm", "manifests"]));
            state.kind = Some(input.show_quick_pick(&pick).await?.label);
            Ok(Transition::Done)
        }
    }

    async fn run_script(
        resume: bool,
        script: Vec<Scripted>,
    ) -> (Result<Trail, WizardError>, ScriptedHost) {
        let mut runner = WizardRunner::new(ScriptedHost::new(script)).with_name("test");
        let result = runner
            .run(Arc::new(PickTarget { resume }), Trail::default())
            .await;
        (result, runner.into_host())
    }

    #[tokio::test(start_paused = true)]
    async fn visits_every_step_in_order() {
        let (result, host) = run_script(
            false,
            vec![
                Scripted::pick(1),
                Scripted::accept("8080"),
                Scripted::pick(0),
            ],
        )
        .await;

        let trail = result.expect("wizard completes");
        assert_eq!(trail.visited, vec!["target", "port", "kind"]);
        assert_eq!(trail.target.as_deref(), Some("y"));
        assert_eq!(trail.port.as_deref(), Some("8080"));
        assert_eq!(trail.kind.as_deref(), Some("helm"));
        assert_eq!(host.remaining(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn invalid_port_stays_on_the_same_prompt() {
        let (result, host) = run_script(
            false,
            vec![
                Scripted::pick(0),
                Scripted::accept("70000"),
                Scripted::accept("8080"),
                Scripted::pick(1),
            ],
        )
        .await;

        let trail = result.expect("wizard completes");
        assert_eq!(trail.visited, vec!["target", "port", "kind"]);
        assert_eq!(trail.port.as_deref(), Some("8080"));
        assert_eq!(trail.kind.as_deref(), Some("manifests"));
        assert_eq!(host.errors(), vec!["port must be 1..65535"]);
    }

    #[tokio::test(start_paused = true)]
    async fn back_reinvokes_previous_step_with_its_answer() {
        let (result, host) = run_script(
            false,
            vec![
                Scripted::pick(1),
                Scripted::back_text(),
                Scripted::pick(0),
                Scripted::accept("80"),
                Scripted::pick(0),
            ],
        )
        .await;

        let trail = result.expect("wizard completes");
        assert_eq!(
            trail.visited,
            vec!["target", "port", "target", "port", "kind"]
        );
        assert_eq!(trail.target.as_deref(), Some("x"));

        let actives: Vec<Option<&str>> = host
            .shown()
            .iter()
            .filter_map(|shown| match shown {
                Shown::Choice { title, active, .. } if title == "target" => Some(active.as_deref()),
                _ => None,
            })
            .collect();
        assert_eq!(actives, vec![None, Some("y")]);
    }

    #[tokio::test(start_paused = true)]
    async fn back_keeps_fields_written_by_later_steps() {
        let (result, host) = run_script(
            false,
            vec![
                Scripted::pick(0),
                Scripted::accept("8080"),
                Scripted::back_choice(),
                Scripted::back_text(),
                Scripted::pick(1),
                Scripted::accept("9090"),
                Scripted::pick(0),
            ],
        )
        .await;

        let trail = result.expect("wizard completes");
        assert_eq!(
            trail.visited,
            vec!["target", "port", "kind", "port", "target", "port", "kind"]
        );
        assert_eq!(trail.target.as_deref(), Some("y"));
        assert_eq!(trail.port.as_deref(), Some("9090"));

        let prefilled: Vec<&str> = host
            .shown()
            .iter()
            .filter_map(|shown| match shown {
                Shown::Text { value, .. } => Some(value.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(prefilled, vec!["", "8080", "8080"]);
    }

    #[tokio::test(start_paused = true)]
    async fn first_step_offers_no_back_and_ignores_it() {
        let (result, host) = run_script(
            false,
            vec![
                Scripted::back_choice(),
                Scripted::pick(0),
                Scripted::accept("22"),
                Scripted::pick(0),
            ],
        )
        .await;

        let trail = result.expect("wizard completes");
        assert_eq!(trail.visited, vec!["target", "port", "kind"]);
        match &host.shown()[0] {
            Shown::Choice { can_go_back, .. } => assert!(!can_go_back),
            other => panic!("unexpected first prompt {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn dismiss_without_resume_cancels_the_run() {
        let (result, host) =
            run_script(false, vec![Scripted::pick(0), Scripted::dismiss_text()]).await;

        let error = result.expect_err("wizard is cancelled");
        assert!(error.is_cancelled());
        assert!(!host.prompt_titles().contains(&"kind"));
    }

    #[tokio::test(start_paused = true)]
    async fn dismiss_with_resume_reprompts_with_clean_validation() {
        let (result, host) = run_script(
            true,
            vec![
                Scripted::pick(0),
                Scripted::accept("0"),
                Scripted::dismiss_text(),
                Scripted::accept("443"),
                Scripted::pick(0),
            ],
        )
        .await;

        let trail = result.expect("wizard completes");
        assert_eq!(trail.visited, vec!["target", "port", "port", "kind"]);
        assert_eq!(trail.port.as_deref(), Some("443"));

        let reopened = host
            .shown()
            .iter()
            .rposition(|shown| matches!(shown, Shown::Text { .. }))
            .expect("port prompt shown twice");
        let after: Vec<&Shown> = host.shown()[reopened..].iter().collect();
        assert!(!after.iter().any(|shown| matches!(shown, Shown::Error(_))));
        assert_eq!(host.errors().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn host_failure_ends_the_run() {
        let (result, host) = run_script(
            false,
            vec![Scripted::pick(0), Scripted::Fail("surface gone".to_string())],
        )
        .await;

        assert!(matches!(
            result,
            Err(WizardError::Host(HostError::Unavailable(message))) if message == "surface gone"
        ));
        assert!(!host.prompt_titles().contains(&"kind"));
    }

    #[tokio::test]
    async fn out_of_range_pick_is_a_host_failure() {
        let (result, _host) = run_script(false, vec![Scripted::pick(7)]).await;
        assert!(matches!(
            result,
            Err(WizardError::Host(HostError::ChoiceOutOfRange { index: 7, len: 2 }))
        ));
    }

    struct Typed {
        check: Validate,
    }

    #[async_trait]
    impl Step<Trail> for Typed {
        async fn run(&self, input: &mut StepInput<'_>, state: &mut Trail) -> StepResult<Trail> {
            let prompt = InputBox::new("digits", 1, 1).with_validate(self.check.clone());
            state.port = Some(input.show_input_box(&prompt).await?);
            Ok(Transition::Done)
        }
    }

    async fn type_digits(check: Validate) -> ScriptedHost {
        let script = vec![
            Scripted::type_text("1"),
            Scripted::type_text("12"),
            Scripted::type_text("123"),
            Scripted::wait_ms(1000),
            Scripted::accept("123"),
        ];
        let mut runner = WizardRunner::new(ScriptedHost::new(script));
        let trail = runner
            .run(Arc::new(Typed { check }), Trail::default())
            .await
            .expect("wizard completes");
        assert_eq!(trail.port.as_deref(), Some("123"));
        runner.into_host()
    }

    fn too_short_after(delay: fn(usize) -> u64) -> Validate {
        validator(move |value: String| async move {
            tokio::time::sleep(Duration::from_millis(delay(value.len()))).await;
            (value.len() < 3).then(|| "too short".to_string())
        })
    }

    #[tokio::test(start_paused = true)]
    async fn only_latest_validation_is_shown_when_it_settles_first() {
        let host = type_digits(too_short_after(|len| (4 - len as u64) * 100)).await;
        assert!(host.errors().is_empty());
        let statuses: Vec<&Shown> = host
            .shown()
            .iter()
            .filter(|shown| matches!(shown, Shown::Cleared | Shown::Error(_)))
            .collect();
        assert_eq!(statuses, vec![&Shown::Cleared]);
    }

    #[tokio::test(start_paused = true)]
    async fn only_latest_validation_is_shown_when_it_settles_last() {
        let host = type_digits(too_short_after(|len| len as u64 * 100)).await;
        assert!(host.errors().is_empty());
        let statuses: Vec<&Shown> = host
            .shown()
            .iter()
            .filter(|shown| matches!(shown, Shown::Cleared | Shown::Error(_)))
            .collect();
        assert_eq!(statuses, vec![&Shown::Cleared]);
    }

    struct BadIndicator;

    #[async_trait]
    impl Step<Trail> for BadIndicator {
        async fn run(&self, input: &mut StepInput<'_>, _state: &mut Trail) -> StepResult<Trail> {
            input.show_input_box(&InputBox::new("broken", 3, 2)).await?;
            Ok(Transition::Done)
        }
    }

    #[tokio::test]
    async fn step_number_past_total_is_rejected() {
        let mut runner = WizardRunner::new(ScriptedHost::new(Vec::new()));
        let result = runner.run(Arc::new(BadIndicator), Trail::default()).await;
        assert!(matches!(result, Err(WizardError::InvalidPrompt(_))));
    }

    struct PickAgain;

    #[async_trait]
    impl Step<Trail> for PickAgain {
        async fn run(&self, input: &mut StepInput<'_>, state: &mut Trail) -> StepResult<Trail> {
            state.visited.push("again");
            let pick = QuickPick::new("again", 1, 1)
                .with_items(QuickPickItem::from_labels(["x", "y"]))
                .with_active_item(state.target.as_deref())
                .with_should_resume(resume_always());
            state.target = Some(input.show_quick_pick(&pick).await?.label);
            Ok(Transition::Done)
        }
    }

    #[tokio::test]
    async fn dismissed_pick_with_resume_is_shown_again_with_its_selection() {
        let script = vec![Scripted::dismiss_choice(), Scripted::pick(0)];
        let mut runner = WizardRunner::new(ScriptedHost::new(script));
        let seed = Trail {
            target: Some("y".to_string()),
            ..Trail::default()
        };

        let trail = runner
            .run(Arc::new(PickAgain), seed)
            .await
            .expect("wizard completes");

        assert_eq!(trail.visited, vec!["again", "again"]);
        assert_eq!(trail.target.as_deref(), Some("x"));
        let actives: Vec<Option<&str>> = runner
            .host()
            .shown()
            .iter()
            .filter_map(|shown| match shown {
                Shown::Choice { active, .. } => Some(active.as_deref()),
                _ => None,
            })
            .collect();
        assert_eq!(actives, vec![Some("y"), Some("y")]);
    }

    fn missing_on_first_call(calls: Arc<AtomicUsize>) -> Validate {
        validator(move |_value: String| {
            let calls = calls.clone();
            async move {
                let seen = calls.fetch_add(1, Ordering::SeqCst);
                (seen == 0).then(|| "missing".to_string())
            }
        })
    }

    #[tokio::test(start_paused = true)]
    async fn accepting_rejected_text_again_revalidates_it() {
        let calls = Arc::new(AtomicUsize::new(0));
        let step = Typed {
            check: missing_on_first_call(calls.clone()),
        };
        let script = vec![Scripted::accept("x"), Scripted::accept("x")];
        let mut runner = WizardRunner::new(ScriptedHost::new(script));

        let trail = runner
            .run(Arc::new(step), Trail::default())
            .await
            .expect("second accept passes");

        assert_eq!(trail.port.as_deref(), Some("x"));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(runner.host().errors(), vec!["missing"]);
    }
}
