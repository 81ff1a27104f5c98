//! Terminal wizard: a line-based REPL that drives sessions screen by screen.

use std::sync::Arc;

use anyhow::Result;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, Lines};

use crate::ai::{
    self, EMOTIONS, PromptType, ReframeService, apply_i_statement, apply_suggestion, full_prompt,
};
use crate::error::SessionError;
use crate::session::{AcknowledgmentType, IStatement, Location, Session, SessionStatus};
use crate::store::SessionStore;
use crate::wizard::{SessionAccessor, StepSubmission, partner_name, start, submit};

const HELP: &str = "\
Commands:
  new              start a conversation
  resume <id>      continue an unfinished conversation
  history          list conversations
  show <id>        print a conversation's summary
  delete <id>      remove one conversation
  clear            remove every conversation
  about            what this is
  quit             exit";

const ABOUT: &str = "\
Soft Startup walks two partners through a gentle way to raise a disagreement.
Partner A shares a feeling, the problem and a request. Partner B reflects back,
responds to the request, then shares their own feelings. Everything stays on
this device.";

/// Line-oriented input and output.
pub struct Terminal<R, W> {
    lines: Lines<R>,
    out: W,
}

impl<R, W> Terminal<R, W>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    pub fn new(reader: R, out: W) -> Self {
        Self {
            lines: reader.lines(),
            out,
        }
    }

    pub fn into_output(self) -> W {
        self.out
    }

    async fn say(&mut self, text: &str) -> std::io::Result<()> {
        self.out.write_all(text.as_bytes()).await?;
        self.out.write_all(b"\n").await?;
        self.out.flush().await
    }

    /// Prompt and read one trimmed line. `None` at end of input.
    async fn ask(&mut self, prompt: &str) -> std::io::Result<Option<String>> {
        self.out.write_all(prompt.as_bytes()).await?;
        self.out.write_all(b" ").await?;
        self.out.flush().await?;
        Ok(self
            .lines
            .next_line()
            .await?
            .map(|line| line.trim().to_string()))
    }

    async fn confirm(&mut self, prompt: &str) -> std::io::Result<Option<bool>> {
        let answer = self.ask(&format!("{prompt} [y/N]")).await?;
        Ok(answer.map(|a| matches!(a.to_lowercase().as_str(), "y" | "yes")))
    }
}

/// Interactive front end over a [`SessionStore`].
pub struct Wizard<'a, R, W> {
    store: &'a SessionStore,
    ai: Option<Arc<dyn ReframeService>>,
    term: Terminal<R, W>,
}

impl<'a, R, W> Wizard<'a, R, W>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    pub fn new(
        store: &'a SessionStore,
        ai: Option<Arc<dyn ReframeService>>,
        term: Terminal<R, W>,
    ) -> Self {
        Self { store, ai, term }
    }

    pub fn into_terminal(self) -> Terminal<R, W> {
        self.term
    }

    /// Command loop. Returns at `quit` or end of input.
    ///
    /// A failing command is reported and the loop carries on; only a
    /// broken terminal ends it early.
    pub async fn run(&mut self) -> Result<()> {
        self.term.say(HELP).await?;
        loop {
            let Some(line) = self.term.ask(">").await? else {
                return Ok(());
            };
            let mut parts = line.splitn(2, char::is_whitespace);
            let command = parts.next().unwrap_or_default();
            let arg = parts.next().map(str::trim).unwrap_or_default();

            match self.dispatch(command, arg).await {
                Ok(true) => return Ok(()),
                Ok(false) => {}
                Err(e) => {
                    tracing::warn!(command, "Command failed: {e:#}");
                    self.term
                        .say(&format!("Something went wrong: {e}"))
                        .await?;
                }
            }
        }
    }

    /// Run one command. `Ok(true)` means quit.
    async fn dispatch(&mut self, command: &str, arg: &str) -> Result<bool> {
        match command {
            "" => {}
            "new" => self.new_session().await?,
            "resume" => self.resume(arg).await?,
            "history" => self.history().await?,
            "show" => self.show(arg).await?,
            "delete" => {
                let msg = if self.store.delete(arg)? {
                    "Deleted."
                } else {
                    "No conversation with that id."
                };
                self.term.say(msg).await?;
            }
            "clear" => {
                if self
                    .term
                    .confirm("Remove every conversation?")
                    .await?
                    .unwrap_or(false)
                {
                    self.store.clear_all()?;
                    self.term.say("All conversations removed.").await?;
                }
            }
            "about" => self.term.say(ABOUT).await?,
            "help" => self.term.say(HELP).await?,
            "quit" | "exit" => return Ok(true),
            other => {
                self.term
                    .say(&format!("Unknown command '{other}'. Type help."))
                    .await?
            }
        }
        Ok(false)
    }

    async fn new_session(&mut self) -> Result<()> {
        let Some(a) = self.term.ask("Who is starting the conversation?").await? else {
            return Ok(());
        };
        let Some(b) = self.term.ask("Who are they talking with?").await? else {
            return Ok(());
        };
        let Some(topic) = self.term.ask("Topic (optional):").await? else {
            return Ok(());
        };
        let topic = Some(topic.as_str()).filter(|t| !t.is_empty());
        let (session, _) = start(self.store, &a, &b, topic)?;
        self.term
            .say(&format!("Started conversation {}", session.id))
            .await?;
        self.drive(&session.id).await
    }

    async fn resume(&mut self, id: &str) -> Result<()> {
        match self.store.get(id) {
            None => self.term.say("No conversation with that id.").await?,
            Some(s) if s.is_completed() => self.term.say(&summary(&s)).await?,
            Some(s) => self.drive(&s.id).await?,
        }
        Ok(())
    }

    async fn history(&mut self) -> Result<()> {
        let sessions = self.store.list_all();
        if sessions.is_empty() {
            self.term.say("No conversations yet.").await?;
            return Ok(());
        }
        for s in &sessions {
            let line = format!(
                "{}  {} & {}  {}  {}",
                s.id,
                s.partner_a,
                s.partner_b,
                s.created_at.format("%Y-%m-%d %H:%M"),
                match s.status {
                    SessionStatus::Completed => s.topic.clone().unwrap_or_default(),
                    SessionStatus::InProgress => format!("in progress ({})", s.current_phase),
                }
            );
            self.term.say(line.trim_end()).await?;
        }
        Ok(())
    }

    async fn show(&mut self, id: &str) -> Result<()> {
        match self.store.get(id) {
            Some(s) => self.term.say(&summary(&s)).await?,
            None => self.term.say("No conversation with that id.").await?,
        }
        Ok(())
    }

    /// Walk a session from its current screen to the summary.
    async fn drive(&mut self, id: &str) -> Result<()> {
        loop {
            let mut accessor = SessionAccessor::open(self.store, id);
            let Some(session) = accessor.session().cloned() else {
                self.term.say("Session not found.").await?;
                return Ok(());
            };
            let Some(location) = accessor.location() else {
                return Ok(());
            };
            if location == Location::Summary {
                self.term.say(&summary(&session)).await?;
                return Ok(());
            }

            if let Some(info) = accessor.step_info() {
                let name = partner_name(&session, info.role);
                self.term
                    .say(&format!(
                        "\n{name}: step {} of {} ({}%) {}",
                        info.display_step,
                        info.total_steps,
                        info.progress_percent(),
                        info.title
                    ))
                    .await?;
            }

            let Some(submission) = self.collect(location, &session).await? else {
                self.term
                    .say(&format!("Progress saved. Continue later with: resume {id}"))
                    .await?;
                return Ok(());
            };

            match submit(&mut accessor, submission) {
                Ok(_) => {}
                Err(SessionError::InvalidInput { reason, .. }) => {
                    self.term.say(&format!("Not yet: {reason}.")).await?;
                }
                Err(SessionError::NotFound { .. }) => {
                    self.term.say("Session not found.").await?;
                    return Ok(());
                }
                Err(e) => {
                    tracing::warn!(session_id = %id, "Step not saved: {e}");
                    self.term
                        .say(&format!(
                            "Couldn't save this step: {e}. Continue later with: resume {id}"
                        ))
                        .await?;
                    return Ok(());
                }
            }
        }
    }

    /// Gather one screen's inputs. `None` when input ran out.
    async fn collect(
        &mut self,
        location: Location,
        session: &Session,
    ) -> Result<Option<StepSubmission>> {
        let a = session.partner_a.as_str();
        let b = session.partner_b.as_str();

        let submission = match location {
            Location::Readiness => {
                self.term
                    .say("Before we begin, let's make sure this is a good moment for both of you.")
                    .await?;
                let Some(calm) = self.term.confirm("Is this a calm moment?").await? else {
                    return Ok(None);
                };
                let Some(relaxed) = self
                    .term
                    .confirm(&format!("Does {b} seem relaxed and open to talking?"))
                    .await?
                else {
                    return Ok(None);
                };
                if !(calm && relaxed) {
                    self.offer_help(location, "I need to find a better time", Some(b), None)
                        .await?;
                }
                StepSubmission::Readiness { calm, relaxed }
            }
            Location::Approach => {
                self.term
                    .say("Start softly. Describe, don't blame. Be polite and appreciative.")
                    .await?;
                if self.term.ask("Press Enter when ready.").await?.is_none() {
                    return Ok(None);
                }
                StepSubmission::Approach
            }
            Location::Intent => {
                let Some(text) = self
                    .ask_text(
                        location,
                        &format!("How would you acknowledge {b}'s good intentions? (optional)"),
                        Some(b),
                        None,
                    )
                    .await?
                else {
                    return Ok(None);
                };
                let confirmed = if text.is_empty() {
                    let Some(c) = self
                        .term
                        .confirm(&format!("Do you believe {b} meant well?"))
                        .await?
                    else {
                        return Ok(None);
                    };
                    c
                } else {
                    true
                };
                StepSubmission::Intent {
                    acknowledgment: text,
                    confirmed,
                }
            }
            Location::IStatement | Location::BStatement => {
                let other = if location == Location::IStatement { b } else { a };
                let Some(statement) = self.ask_i_statement(other).await? else {
                    return Ok(None);
                };
                if location == Location::IStatement {
                    StepSubmission::IStatement(statement)
                } else {
                    StepSubmission::BStatement(statement)
                }
            }
            Location::Problem => {
                let Some(text) = self
                    .ask_text(location, "What happened, described as facts?", Some(b), None)
                    .await?
                else {
                    return Ok(None);
                };
                StepSubmission::Problem(text)
            }
            Location::Request => {
                let Some(text) = self
                    .ask_text(location, &format!("What would you like {b} to do?"), Some(b), None)
                    .await?
                else {
                    return Ok(None);
                };
                StepSubmission::Request(text)
            }
            Location::Transition => {
                self.term
                    .say(&format!(
                        "Thank you, {a}. Please hand the device to {b}."
                    ))
                    .await?;
                if self
                    .term
                    .ask(&format!("{b}, press Enter when you're ready."))
                    .await?
                    .is_none()
                {
                    return Ok(None);
                }
                StepSubmission::Transition
            }
            Location::Reflect => {
                let shared = session.partner_a_data.i_statement.sentence();
                self.term.say(&format!("{a} shared: \"{shared}\"")).await?;
                let Some(text) = self
                    .ask_text(
                        location,
                        &format!("Reflect back what you heard from {a}:"),
                        Some(a),
                        Some(&shared),
                    )
                    .await?
                else {
                    return Ok(None);
                };
                StepSubmission::Reflect(text)
            }
            Location::Acknowledge => {
                let request = session.partner_a_data.request.clone();
                self.term.say(&format!("{a} asked: \"{request}\"")).await?;
                let Some(kind) = self.ask_acknowledgment_type().await? else {
                    return Ok(None);
                };
                let Some(text) = self
                    .ask_text(location, "Your response:", Some(a), Some(&request))
                    .await?
                else {
                    return Ok(None);
                };
                StepSubmission::Acknowledge { kind, text }
            }
            Location::BRequest => {
                let Some(text) = self
                    .ask_text(
                        location,
                        &format!("Anything you'd like to ask of {a}? (Enter to skip)"),
                        Some(a),
                        None,
                    )
                    .await?
                else {
                    return Ok(None);
                };
                StepSubmission::BRequest(Some(text).filter(|t| !t.is_empty()))
            }
            Location::New | Location::Summary | Location::History | Location::About => {
                return Ok(None);
            }
        };
        Ok(Some(submission))
    }

    async fn ask_acknowledgment_type(&mut self) -> Result<Option<AcknowledgmentType>> {
        let kinds = [
            AcknowledgmentType::Accept,
            AcknowledgmentType::Discuss,
            AcknowledgmentType::Counter,
        ];
        for (i, kind) in kinds.iter().enumerate() {
            self.term
                .say(&format!("  {}. {}", i + 1, kind.description()))
                .await?;
        }
        let Some(choice) = self.term.ask("Choose 1-3:").await? else {
            return Ok(None);
        };
        let kind = choice
            .parse::<usize>()
            .ok()
            .and_then(|n| n.checked_sub(1))
            .and_then(|i| kinds.get(i).copied())
            .unwrap_or(AcknowledgmentType::Unset);
        Ok(Some(kind))
    }

    async fn ask_i_statement(&mut self, other: &str) -> Result<Option<IStatement>> {
        let mut draft = IStatement::default();

        if let Some(service) = self.ai.clone() {
            let Some(raw) = self
                .term
                .ask("Say it however it comes out and AI will help shape it (Enter to skip):")
                .await?
            else {
                return Ok(None);
            };
            if !raw.is_empty() {
                let outcome = service.reframe_i_statement(&raw).await;
                if let Err(notice) = apply_i_statement(&mut draft, outcome) {
                    self.term.say(notice).await?;
                }
            }
            let context = if raw.is_empty() { draft.situation.clone() } else { raw };
            let emotions = ai::suggest_emotions_or_default(service.as_ref(), &context).await;
            self.term
                .say(&format!("Suggested feelings: {}", emotions.join(", ")))
                .await?;
        } else {
            self.term
                .say(&format!("Feelings: {}", EMOTIONS.join(", ")))
                .await?;
        }

        let Some(emotion) = self
            .term
            .ask(&prefilled("I feel...", &draft.emotion))
            .await?
        else {
            return Ok(None);
        };
        if !emotion.is_empty() {
            draft.emotion = emotion;
        }
        let Some(situation) = self
            .term
            .ask(&prefilled("when...", &draft.situation))
            .await?
        else {
            return Ok(None);
        };
        if !situation.is_empty() {
            draft.situation = situation;
        }

        if draft.is_complete() && draft.refined.is_none() {
            let sentence = draft.sentence();
            if let Some(refined) = self
                .suggest(PromptType::IStatement, &sentence, Some(other), None)
                .await?
            {
                draft.refined = Some(refined);
            }
        }
        Ok(Some(draft))
    }

    /// Read a free-text field and optionally offer the helper on it.
    async fn ask_text(
        &mut self,
        location: Location,
        prompt: &str,
        partner: Option<&str>,
        context: Option<&str>,
    ) -> Result<Option<String>> {
        let Some(text) = self.term.ask(prompt).await? else {
            return Ok(None);
        };
        if text.is_empty() {
            return Ok(Some(text));
        }
        let Some(prompt_type) = PromptType::for_location(location) else {
            return Ok(Some(text));
        };
        Ok(Some(
            self.suggest(prompt_type, &text, partner, context)
                .await?
                .unwrap_or(text),
        ))
    }

    async fn offer_help(
        &mut self,
        location: Location,
        draft: &str,
        partner: Option<&str>,
        context: Option<&str>,
    ) -> Result<()> {
        if let Some(prompt_type) = PromptType::for_location(location)
            && let Some(text) = self.suggest(prompt_type, draft, partner, context).await?
        {
            self.term.say(&format!("You could say: \"{text}\"")).await?;
        }
        Ok(())
    }

    /// Ask the helper for a rewrite. `Some` only when the user accepts it.
    async fn suggest(
        &mut self,
        prompt_type: PromptType,
        text: &str,
        partner: Option<&str>,
        context: Option<&str>,
    ) -> Result<Option<String>> {
        let Some(service) = self.ai.clone() else {
            return Ok(None);
        };
        if !self
            .term
            .confirm(prompt_type.button_text())
            .await?
            .unwrap_or(false)
        {
            return Ok(None);
        }

        let prompt = full_prompt(prompt_type, partner, context);
        let outcome = service.reframe(text, prompt_type, &prompt).await;
        let mut candidate = text.to_string();
        if let Err(notice) = apply_suggestion(&mut candidate, outcome) {
            self.term.say(notice).await?;
            return Ok(None);
        }

        self.term.say(&format!("Suggestion: \"{candidate}\"")).await?;
        let accepted = self.term.confirm("Use this?").await?.unwrap_or(false);
        Ok(accepted.then_some(candidate))
    }
}

fn prefilled(prompt: &str, current: &str) -> String {
    if current.is_empty() {
        prompt.to_string()
    } else {
        format!("{prompt} [{current}]")
    }
}

fn or_dash(text: &str) -> &str {
    if text.trim().is_empty() { "-" } else { text }
}

/// Plain-text recap of a session.
pub fn summary(session: &Session) -> String {
    let a = &session.partner_a_data;
    let r = &session.partner_b_responses;
    let b = &session.partner_b_data;

    let mut out = format!("\n{} & {}", session.partner_a, session.partner_b);
    if let Some(topic) = &session.topic {
        out.push_str(&format!(": {topic}"));
    }
    out.push('\n');
    if let Some(done) = session.completed_at {
        out.push_str(&format!("Completed {}\n", done.format("%Y-%m-%d %H:%M")));
    }

    let statement = |s: &IStatement| s.refined.clone().unwrap_or_else(|| s.sentence());

    out.push_str(&format!("\n{} shared\n", session.partner_a));
    out.push_str(&format!("  Feeling:  {}\n", or_dash(&statement(&a.i_statement))));
    out.push_str(&format!("  Problem:  {}\n", or_dash(&a.problem_description)));
    out.push_str(&format!("  Request:  {}\n", or_dash(&a.request)));

    out.push_str(&format!("\n{} responded\n", session.partner_b));
    out.push_str(&format!("  Reflection: {}\n", or_dash(&r.reflection)));
    if r.acknowledgment_type.is_set() {
        out.push_str(&format!(
            "  Response:   {} ({})\n",
            or_dash(&r.acknowledgment),
            r.acknowledgment_type.description()
        ));
    } else {
        out.push_str(&format!("  Response:   {}\n", or_dash(&r.acknowledgment)));
    }

    out.push_str(&format!("\n{} shared\n", session.partner_b));
    out.push_str(&format!("  Feeling:  {}\n", or_dash(&statement(&b.i_statement))));
    out.push_str(&format!(
        "  Request:  {}\n",
        b.request.as_deref().unwrap_or("(no request)")
    ));
    out
}
