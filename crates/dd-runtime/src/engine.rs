//! The runtime state machine that drives a story.
//!
//! An [`Engine`] owns the story model, the author's script variables, and
//! the undo slot, and funnels every visible operation through one `print`
//! choke point: snapshot for undo, run the before/after hooks, hand the
//! content to the presentation adapter, bump the counters. Scripts run
//! against a fresh [`PublicStory`] facade per invocation; navigation they
//! request is queued as directives and drained when the outermost
//! operation completes, so hooks cannot recurse into the engine.

use dd_core::document::HookKind;
use dd_core::model::{ActionDef, Counters, Page, Paragraph, StoryModel, StoryObject};
use dd_core::{Content, INTRO_PAGE};
use dd_dsl::StoryFormat;

use crate::adapter::{NullPresentation, Presentation};
use crate::error::{EngineError, EngineResult};
use crate::public::{Directive, PublicState, PublicStory};
use crate::pubsub::{INVENTORY_CHANGED, INVENTORY_CHANNEL, MessageCenter};
use crate::sandbox::{DedScript, ScriptSandbox};
use crate::snapshot::{Snapshot, merge_values};

/// Upper bound on script-requested navigation steps per operation. A
/// drain that exceeds it means a hook loop, such as a page-turn hook that
/// keeps turning pages.
const MAX_DIRECTIVE_STEPS: usize = 64;

/// What happened when an action was performed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionOutcome {
    /// The action printed its content and is done.
    Performed,
    /// The action needs a combination partner; nothing was printed. The
    /// caller picks a partner from [`Engine::combination_candidates`] and
    /// resolves or cancels.
    AwaitingPartner,
}

/// A combination action waiting for its second target.
#[derive(Debug, Clone, PartialEq, Eq)]
struct PendingCombination {
    object: String,
    action: String,
}

/// The Dedalus runtime.
///
/// Generic over the presentation adapter and the script sandbox so tests
/// can run headless and inject recording implementations. The original
/// source text is preserved: reset and restore re-run the full compile
/// pipeline against it instead of mutating a parsed tree in place.
pub struct Engine<P: Presentation = NullPresentation, S: ScriptSandbox = DedScript> {
    source: String,
    format: StoryFormat,
    model: StoryModel,
    public: PublicState,
    events: MessageCenter,
    directives: Vec<Directive>,
    undo_slot: Option<Snapshot>,
    pending_combination: Option<PendingCombination>,
    ended: bool,
    presentation: P,
    sandbox: S,
}

/// Compile `source`, failing on error diagnostics.
fn compile(source: &str, format: StoryFormat) -> EngineResult<StoryModel> {
    let result = dd_dsl::compile_source(source, format);
    if result.has_errors() {
        return Err(EngineError::Compile(result.diagnostics));
    }
    Ok(result.model)
}

impl Engine<NullPresentation, DedScript> {
    /// A headless engine with the default sandbox, for tools and tests.
    pub fn headless(source: impl Into<String>, format: StoryFormat) -> EngineResult<Self> {
        Self::new(source, format, NullPresentation, DedScript)
    }
}

impl<P: Presentation, S: ScriptSandbox> Engine<P, S> {
    /// Compile `source` and build an engine around the result.
    ///
    /// Construction only compiles; nothing is shown until [`Engine::start`].
    pub fn new(
        source: impl Into<String>,
        format: StoryFormat,
        presentation: P,
        sandbox: S,
    ) -> EngineResult<Self> {
        let source = source.into();
        let model = compile(&source, format)?;
        Ok(Self {
            source,
            format,
            model,
            public: PublicState::default(),
            events: MessageCenter::new(),
            directives: Vec::new(),
            undo_slot: None,
            pending_combination: None,
            ended: false,
            presentation,
            sandbox,
        })
    }

    /// Begin the story: show the intro content (if any), turn to the
    /// first page with the page-turn effect suppressed, zero the
    /// counters, announce the (empty) inventory, and run the init script.
    ///
    /// A script fault aborts startup and propagates.
    pub fn start(&mut self) -> EngineResult<()> {
        if self.model.page(INTRO_PAGE).is_some() {
            self.turn_to_inner(INTRO_PAGE, false)?;
        }
        let first = self.model.current_page.clone();
        self.turn_to_inner(&first, true)?;
        self.model.counters.reset();
        self.events.publish(INVENTORY_CHANNEL, INVENTORY_CHANGED);

        let init = self.model.initialization.clone();
        self.run_script(&init)?;
        self.drain_directives()
    }

    /// Restart from scratch: re-compile the preserved source into a fresh
    /// model and public state, then run the [`Engine::start`] sequence.
    pub fn reset(&mut self) -> EngineResult<()> {
        self.model = compile(&self.source, self.format)?;
        self.public = PublicState::default();
        self.undo_slot = None;
        self.pending_combination = None;
        self.ended = false;
        self.start()
    }

    /// Turn to a page. With `no_turn` the content is appended without a
    /// page-turn effect and the current page stays unchanged; otherwise
    /// the page replaces the display and becomes current — except for the
    /// reserved intro page, which never becomes current.
    pub fn turn_to(&mut self, target: &str, no_turn: bool) -> EngineResult<()> {
        self.turn_to_inner(target, no_turn)?;
        self.drain_directives()
    }

    fn turn_to_inner(&mut self, target: &str, no_turn: bool) -> EngineResult<()> {
        let content = self
            .model
            .page(target)
            .ok_or_else(|| EngineError::PageNotFound(target.to_string()))?
            .content
            .clone();

        self.run_hook(HookKind::BeforeEveryPageTurn)?;

        if no_turn {
            self.print(&content, false)?;
        } else {
            self.print(&content, true)?;
            if target != INTRO_PAGE {
                self.model.current_page = target.to_string();
            }
        }

        self.run_hook(HookKind::AfterEveryPageTurn)?;

        self.model.counters.paragraphs_shown_in_page = 0;
        self.model.counters.actions_performed_in_page = 0;
        self.model.counters.pages_turned += 1;
        Ok(())
    }

    /// Reveal a paragraph without changing the current page. A paragraph
    /// scoped to the current page shadows a top-level one of the same id.
    pub fn show_paragraph(&mut self, target: &str) -> EngineResult<()> {
        self.show_paragraph_inner(target)?;
        self.drain_directives()
    }

    fn show_paragraph_inner(&mut self, target: &str) -> EngineResult<()> {
        let content = self
            .model
            .paragraph(target)
            .ok_or_else(|| EngineError::ParagraphNotFound(target.to_string()))?
            .content
            .clone();

        self.run_hook(HookKind::BeforeEveryParagraphShown)?;
        self.print(&content, false)?;
        self.run_hook(HookKind::AfterEveryParagraphShown)?;

        self.model.counters.paragraphs_shown += 1;
        self.model.counters.paragraphs_shown_in_page += 1;
        Ok(())
    }

    /// The single choke point every visible operation goes through.
    fn print(&mut self, content: &Content, is_page_turn: bool) -> EngineResult<()> {
        self.undo_slot = Some(Snapshot {
            public: self.public.clone(),
            model: self.model.clone(),
        });
        self.presentation.capture_undo_snapshot();

        self.run_hook(HookKind::BeforeEveryThing)?;
        self.presentation.render_print(content, is_page_turn);
        self.run_hook(HookKind::AfterEveryThing)?;

        self.model.counters.total_actions += 1;
        self.model.counters.actions_performed_in_page += 1;
        Ok(())
    }

    /// The subset of an object's actions whose when-predicate currently
    /// evaluates true, in authoring order. An action with no predicate is
    /// always included. Predicate faults propagate.
    pub fn active_actions(&mut self, object_id: &str) -> EngineResult<Vec<ActionDef>> {
        let actions = self
            .model
            .object(object_id)
            .ok_or_else(|| EngineError::ObjectNotFound(object_id.to_string()))?
            .actions
            .clone();

        let mut active = Vec::new();
        for action in actions {
            let keep = match &action.when {
                None => true,
                Some(predicate) => self.eval_predicate(predicate)?,
            };
            if keep {
                active.push(action);
            }
        }
        Ok(active)
    }

    /// Perform one of an object's actions. If the action has combination
    /// clauses the engine enters combination mode and prints nothing; the
    /// caller resolves or cancels. Otherwise the action's content is
    /// printed directly.
    pub fn perform_action(
        &mut self,
        object_id: &str,
        action_id: &str,
    ) -> EngineResult<ActionOutcome> {
        let object = self
            .model
            .object(object_id)
            .ok_or_else(|| EngineError::ObjectNotFound(object_id.to_string()))?;
        let action = object
            .action(action_id)
            .ok_or_else(|| EngineError::ActionNotFound {
                object: object_id.to_string(),
                action: action_id.to_string(),
            })?;

        if action.has_combinations() {
            self.model.combination_action_in_progress = true;
            self.pending_combination = Some(PendingCombination {
                object: object_id.to_string(),
                action: action_id.to_string(),
            });
            return Ok(ActionOutcome::AwaitingPartner);
        }

        let content = action.content.clone();
        self.print(&content, false)?;
        self.drain_directives()?;
        Ok(ActionOutcome::Performed)
    }

    /// Resolve the pending combination against `partner`: print the
    /// partner-specific content if a clause exists, else the action's own
    /// content, then leave combination mode.
    pub fn resolve_combination(&mut self, partner: &str) -> EngineResult<()> {
        let pending = self
            .pending_combination
            .clone()
            .ok_or(EngineError::NoCombinationInProgress)?;
        if pending.object == partner {
            return Err(EngineError::CombinationWithSelf(partner.to_string()));
        }

        let object = self
            .model
            .object(&pending.object)
            .ok_or_else(|| EngineError::ObjectNotFound(pending.object.clone()))?;
        let action = object
            .action(&pending.action)
            .ok_or_else(|| EngineError::ActionNotFound {
                object: pending.object.clone(),
                action: pending.action.clone(),
            })?;
        let content = action
            .combination(partner)
            .unwrap_or(&action.content)
            .clone();

        self.pending_combination = None;
        self.model.combination_action_in_progress = false;

        self.print(&content, false)?;
        self.drain_directives()
    }

    /// Leave combination mode without printing anything.
    pub fn cancel_combination(&mut self) -> EngineResult<()> {
        if self.pending_combination.take().is_none() {
            return Err(EngineError::NoCombinationInProgress);
        }
        self.model.combination_action_in_progress = false;
        Ok(())
    }

    /// Candidate partners for the pending combination: objects reachable
    /// from the current page's interact links plus the inventory, minus
    /// the originating object, deduplicated in that order.
    pub fn combination_candidates(&self) -> Vec<String> {
        let Some(pending) = &self.pending_combination else {
            return Vec::new();
        };

        let mut candidates: Vec<String> = Vec::new();
        let mut push = |id: &str, candidates: &mut Vec<String>| {
            if id != pending.object && !candidates.iter().any(|c| c == id) {
                candidates.push(id.to_string());
            }
        };

        if let Some(page) = self.model.current() {
            for target in page.content.interact_targets() {
                push(target, &mut candidates);
            }
        }
        for item in &self.model.inventory {
            push(item, &mut candidates);
        }
        candidates
    }

    /// Add an object to the inventory and announce the change.
    pub fn put_in_inventory(&mut self, id: &str) {
        self.model.put_in_inventory(id);
        self.events.publish(INVENTORY_CHANNEL, INVENTORY_CHANGED);
    }

    /// Remove an object from the inventory and announce the change.
    pub fn remove_from_inventory(&mut self, id: &str) {
        self.model.remove_from_inventory(id);
        self.events.publish(INVENTORY_CHANNEL, INVENTORY_CHANGED);
    }

    /// True if the object is currently carried.
    pub fn is_in_inventory(&self, id: &str) -> bool {
        self.model.is_in_inventory(id)
    }

    /// Restore the state saved by the last print. Only one level is kept,
    /// and the slot is retained: a second undo with no intervening
    /// operation restores the same state again. Returns false when no
    /// snapshot exists yet.
    pub fn undo(&mut self) -> bool {
        match &self.undo_slot {
            Some(snapshot) => {
                self.model = snapshot.model.clone();
                self.public = snapshot.public.clone();
                self.pending_combination = None;
                self.presentation.restore_from_undo_snapshot();
                self.events.publish(INVENTORY_CHANNEL, INVENTORY_CHANGED);
                true
            }
            None => false,
        }
    }

    /// Serialize the running state as two JSON blobs and hand them to the
    /// presentation adapter for persistence.
    pub fn save(&mut self) -> EngineResult<()> {
        let public_json = serde_json::to_string(&self.public)?;
        let model_json = serde_json::to_string(&self.model)?;
        self.presentation.persist_snapshot(&public_json, &model_json);
        Ok(())
    }

    /// Restore from the persisted snapshot, if one exists. The saved
    /// blobs are deep-merged over a freshly compiled model, so fields
    /// added since the save keep their defaults. Returns false (and does
    /// nothing) when no save is available — trying to restore is a
    /// routine idempotent action, not a fault.
    pub fn restore(&mut self) -> EngineResult<bool> {
        if !self.presentation.has_persisted_snapshot() {
            return Ok(false);
        }
        let Some((public_json, model_json)) = self.presentation.load_persisted_snapshot() else {
            return Ok(false);
        };

        let fresh = compile(&self.source, self.format)?;
        let merged_model = merge_values(
            serde_json::to_value(&fresh)?,
            serde_json::from_str(&model_json)?,
        );
        let merged_public = merge_values(
            serde_json::to_value(PublicState::default())?,
            serde_json::from_str(&public_json)?,
        );

        self.model = serde_json::from_value(merged_model)?;
        self.public = serde_json::from_value(merged_public)?;
        self.pending_combination = None;
        self.model.combination_action_in_progress = false;
        self.ended = false;

        self.events.publish(INVENTORY_CHANNEL, INVENTORY_CHANGED);

        let current = self.model.current_page.clone();
        self.turn_to_inner(&current, false)?;
        self.drain_directives()?;
        Ok(true)
    }

    /// Disable a rendered link by the id assigned from its dotted target
    /// suffix. The link stays inspectable but not actionable.
    pub fn disable(&mut self, id: &str) {
        self.presentation.set_link_enabled(id, false);
    }

    /// Re-enable a link disabled by [`Engine::disable`].
    pub fn enable(&mut self, id: &str) {
        self.presentation.set_link_enabled(id, true);
    }

    /// End the story: irreversibly strip interactivity from everything
    /// rendered so far. Content stays inspectable.
    pub fn end_game(&mut self) {
        self.end_game_inner();
    }

    fn end_game_inner(&mut self) {
        self.ended = true;
        self.presentation.end_game();
    }

    /// True once [`Engine::end_game`] has run.
    pub fn ended(&self) -> bool {
        self.ended
    }

    /// Story title.
    pub fn title(&self) -> &str {
        &self.model.title
    }

    /// Id of the current page.
    pub fn current_page_id(&self) -> &str {
        &self.model.current_page
    }

    /// The carried object ids, in pickup order.
    pub fn inventory(&self) -> &[String] {
        &self.model.inventory
    }

    /// The progress counters.
    pub fn counters(&self) -> &Counters {
        &self.model.counters
    }

    /// Look up a page. A miss is soft.
    pub fn page(&self, id: &str) -> Option<&Page> {
        self.model.page(id)
    }

    /// Look up an object, current page scope shadowing top level.
    pub fn object(&self, id: &str) -> Option<&StoryObject> {
        self.model.object(id)
    }

    /// Look up a paragraph, current page scope shadowing top level.
    pub fn paragraph(&self, id: &str) -> Option<&Paragraph> {
        self.model.paragraph(id)
    }

    /// The full story model, read-only.
    pub fn model(&self) -> &StoryModel {
        &self.model
    }

    /// The author's script variables, read-only.
    pub fn public_state(&self) -> &PublicState {
        &self.public
    }

    /// The message center, for subscribing to model-change events.
    pub fn events_mut(&mut self) -> &mut MessageCenter {
        &mut self.events
    }

    /// The presentation adapter.
    pub fn presentation(&self) -> &P {
        &self.presentation
    }

    /// The presentation adapter, mutably.
    pub fn presentation_mut(&mut self) -> &mut P {
        &mut self.presentation
    }

    /// Run a hook body, if declared.
    fn run_hook(&mut self, kind: HookKind) -> EngineResult<()> {
        let body = self.model.hooks.body(kind).to_string();
        self.run_script(&body)
    }

    /// Run a script body against a fresh facade.
    fn run_script(&mut self, body: &str) -> EngineResult<()> {
        if body.trim().is_empty() {
            return Ok(());
        }
        let mut facade = PublicStory::new(
            &mut self.model,
            &mut self.public,
            &mut self.events,
            &mut self.directives,
        );
        self.sandbox.run(body, &mut facade)?;
        Ok(())
    }

    /// Evaluate a when-predicate against a fresh facade.
    fn eval_predicate(&mut self, source: &str) -> EngineResult<bool> {
        let mut facade = PublicStory::new(
            &mut self.model,
            &mut self.public,
            &mut self.events,
            &mut self.directives,
        );
        Ok(self.sandbox.eval_predicate(source, &mut facade)?)
    }

    /// Execute queued script directives until none remain. Called at the
    /// end of every outermost operation; the inner operations invoked
    /// here queue follow-ups instead of recursing.
    fn drain_directives(&mut self) -> EngineResult<()> {
        let mut steps = 0;
        while !self.directives.is_empty() {
            for directive in std::mem::take(&mut self.directives) {
                steps += 1;
                if steps > MAX_DIRECTIVE_STEPS {
                    return Err(EngineError::DirectiveOverflow(MAX_DIRECTIVE_STEPS));
                }
                match directive {
                    Directive::TurnTo(id) => self.turn_to_inner(&id, false)?,
                    Directive::ShowParagraph(id) => self.show_paragraph_inner(&id)?,
                    Directive::Disable(id) => self.presentation.set_link_enabled(&id, false),
                    Directive::Enable(id) => self.presentation.set_link_enabled(&id, true),
                    Directive::EndGame => self.end_game_inner(),
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dd_script::Value;
    use std::cell::RefCell;
    use std::rc::Rc;

    /// A presentation that records everything the engine asks of it and
    /// keeps the persisted blobs in memory.
    #[derive(Default)]
    struct RecordingPresentation {
        prints: Vec<(String, bool)>,
        undo_captures: usize,
        undo_restores: usize,
        store: Option<(String, String)>,
        link_toggles: Vec<(String, bool)>,
        ended: bool,
    }

    impl Presentation for RecordingPresentation {
        fn render_print(&mut self, content: &Content, is_page_turn: bool) -> bool {
            self.prints.push((content.plain_text(), is_page_turn));
            true
        }

        fn capture_undo_snapshot(&mut self) {
            self.undo_captures += 1;
        }

        fn restore_from_undo_snapshot(&mut self) {
            self.undo_restores += 1;
        }

        fn persist_snapshot(&mut self, public_json: &str, model_json: &str) {
            self.store = Some((public_json.to_string(), model_json.to_string()));
        }

        fn has_persisted_snapshot(&self) -> bool {
            self.store.is_some()
        }

        fn load_persisted_snapshot(&mut self) -> Option<(String, String)> {
            self.store.clone()
        }

        fn set_link_enabled(&mut self, id: &str, enabled: bool) {
            self.link_toggles.push((id.to_string(), enabled));
        }

        fn end_game(&mut self) {
            self.ended = true;
        }
    }

    const STORY: &str = r#"Cellar of Wonders
initscript
    story.visits = 0
p.intro
    Welcome to the cellar.
p.start.first
    You stand at the top of the stairs.
    [[cellar]]Go down[[]]
p.cellar
    A dark cellar. There is a {[firstObject]}brass lamp{[]} and a {[door]}heavy door{[]} here.
    ((smell))Sniff the air(())
    pg.smell
        It smells of mould.
o.firstObject."Brass lamp"
    "Get"
        when !story.isInInventory('firstObject')
        You take the lamp.
    "Drop"
        You put the lamp down.
o.key."Rusty key"
    "Use"
        It does not fit anything here.
        with.door
            The key turns and the door creaks open.
c.door
    "Push"
        It will not budge.
"#;

    fn engine() -> Engine<RecordingPresentation, DedScript> {
        Engine::new(
            STORY,
            StoryFormat::Dedlee,
            RecordingPresentation::default(),
            DedScript,
        )
        .unwrap()
    }

    fn started() -> Engine<RecordingPresentation, DedScript> {
        let mut engine = engine();
        engine.start().unwrap();
        engine
    }

    #[test]
    fn construction_fails_on_compile_errors() {
        let result = Engine::headless("<page id=\"a\">unclosed", StoryFormat::Markup);
        assert!(matches!(result, Err(EngineError::Compile(_))));
    }

    #[test]
    fn start_shows_intro_then_first_page_and_zeroes_counters() {
        let engine = started();
        assert_eq!(engine.current_page_id(), "start");
        assert_eq!(*engine.counters(), Counters::default());

        let prints = &engine.presentation().prints;
        assert_eq!(prints[0].0, "Welcome to the cellar.");
        assert!(prints[0].1, "the intro replaces the display");
        assert!(prints[1].0.contains("top of the stairs"));
        assert!(!prints[1].1, "the first page appends without a turn effect");
    }

    #[test]
    fn init_script_runs_at_start() {
        let engine = started();
        assert_eq!(engine.public_state().vars["visits"], Value::Int(0));
    }

    #[test]
    fn init_script_fault_aborts_startup() {
        let source = "Broken\ninitscript\n    story.explode()\np.start.first\n    Hi.";
        let mut engine = Engine::headless(source, StoryFormat::Dedlee).unwrap();
        assert!(matches!(engine.start(), Err(EngineError::Script(_))));
    }

    #[test]
    fn turn_to_changes_page_and_counts() {
        let mut engine = started();
        engine.turn_to("cellar", false).unwrap();

        assert_eq!(engine.current_page_id(), "cellar");
        assert_eq!(engine.counters().pages_turned, 1);
        assert_eq!(engine.counters().actions_performed_in_page, 0);

        let (text, is_turn) = engine.presentation().prints.last().unwrap();
        assert!(text.contains("dark cellar"));
        assert!(is_turn);
    }

    #[test]
    fn turn_to_unknown_page_is_an_error() {
        let mut engine = started();
        assert!(matches!(
            engine.turn_to("attic", false),
            Err(EngineError::PageNotFound(_))
        ));
    }

    #[test]
    fn turn_to_intro_never_becomes_current() {
        let mut engine = started();
        engine.turn_to(INTRO_PAGE, false).unwrap();
        assert_eq!(engine.current_page_id(), "start");
    }

    #[test]
    fn show_paragraph_prefers_page_scope_and_counts() {
        let mut engine = started();
        engine.turn_to("cellar", false).unwrap();
        engine.show_paragraph("smell").unwrap();

        assert_eq!(engine.counters().paragraphs_shown, 1);
        assert_eq!(engine.counters().paragraphs_shown_in_page, 1);
        let (text, is_turn) = engine.presentation().prints.last().unwrap();
        assert_eq!(text, "It smells of mould.");
        assert!(!is_turn);

        // Back at the start page the paragraph is out of scope.
        engine.turn_to("start", false).unwrap();
        assert!(matches!(
            engine.show_paragraph("smell"),
            Err(EngineError::ParagraphNotFound(_))
        ));
    }

    #[test]
    fn active_actions_follow_the_when_predicate() {
        let mut engine = started();

        let ids = |actions: &[ActionDef]| {
            actions.iter().map(|a| a.id.clone()).collect::<Vec<_>>()
        };

        let active = engine.active_actions("firstObject").unwrap();
        assert_eq!(ids(&active), vec!["Get", "Drop"]);

        engine.put_in_inventory("firstObject");
        let active = engine.active_actions("firstObject").unwrap();
        assert_eq!(ids(&active), vec!["Drop"]);

        engine.remove_from_inventory("firstObject");
        let active = engine.active_actions("firstObject").unwrap();
        assert_eq!(ids(&active), vec!["Get", "Drop"]);
    }

    #[test]
    fn perform_action_prints_its_content() {
        let mut engine = started();
        let outcome = engine.perform_action("firstObject", "Get").unwrap();
        assert_eq!(outcome, ActionOutcome::Performed);
        assert_eq!(
            engine.presentation().prints.last().unwrap().0,
            "You take the lamp."
        );
        assert_eq!(engine.counters().total_actions, 1);
    }

    #[test]
    fn combination_resolves_with_partner_specific_content() {
        let mut engine = started();
        engine.turn_to("cellar", false).unwrap();

        let outcome = engine.perform_action("key", "Use").unwrap();
        assert_eq!(outcome, ActionOutcome::AwaitingPartner);
        assert!(engine.model().combination_action_in_progress);

        engine.resolve_combination("door").unwrap();
        assert!(!engine.model().combination_action_in_progress);
        assert_eq!(
            engine.presentation().prints.last().unwrap().0,
            "The key turns and the door creaks open."
        );
    }

    #[test]
    fn combination_falls_back_to_the_action_content() {
        let mut engine = started();
        engine.perform_action("key", "Use").unwrap();
        engine.resolve_combination("firstObject").unwrap();
        assert_eq!(
            engine.presentation().prints.last().unwrap().0,
            "It does not fit anything here."
        );
    }

    #[test]
    fn combination_candidates_exclude_the_origin() {
        let mut engine = started();
        engine.turn_to("cellar", false).unwrap();
        engine.put_in_inventory("key");

        engine.perform_action("key", "Use").unwrap();
        assert_eq!(engine.combination_candidates(), vec!["firstObject", "door"]);
    }

    #[test]
    fn combination_with_self_is_rejected() {
        let mut engine = started();
        engine.perform_action("key", "Use").unwrap();
        assert!(matches!(
            engine.resolve_combination("key"),
            Err(EngineError::CombinationWithSelf(_))
        ));
        // Still pending after the rejection; cancelling clears it.
        engine.cancel_combination().unwrap();
        assert!(!engine.model().combination_action_in_progress);
        assert!(matches!(
            engine.cancel_combination(),
            Err(EngineError::NoCombinationInProgress)
        ));
    }

    #[test]
    fn resolve_without_pending_is_an_error() {
        let mut engine = started();
        assert!(matches!(
            engine.resolve_combination("door"),
            Err(EngineError::NoCombinationInProgress)
        ));
    }

    #[test]
    fn inventory_mutations_publish_events() {
        let mut engine = started();
        let seen = Rc::new(RefCell::new(0));
        let sink = Rc::clone(&seen);
        engine
            .events_mut()
            .subscribe(INVENTORY_CHANNEL, "test", move |message| {
                assert_eq!(message, INVENTORY_CHANGED);
                *sink.borrow_mut() += 1;
            });

        engine.put_in_inventory("firstObject");
        engine.remove_from_inventory("firstObject");
        assert_eq!(*seen.borrow(), 2);
    }

    #[test]
    fn undo_restores_the_previous_state_once() {
        let mut engine = started();
        engine.put_in_inventory("firstObject");
        engine.turn_to("cellar", false).unwrap();

        assert!(engine.undo());
        assert_eq!(engine.current_page_id(), "start");
        assert_eq!(engine.counters().pages_turned, 0);
        assert!(engine.is_in_inventory("firstObject"));
        assert_eq!(engine.presentation().undo_restores, 1);

        // Only one level is kept: a second undo lands on the same state.
        let before = engine.model().clone();
        assert!(engine.undo());
        assert_eq!(*engine.model(), before);
    }

    #[test]
    fn undo_before_any_print_is_a_noop() {
        let mut engine = engine();
        assert!(!engine.undo());
    }

    #[test]
    fn save_and_restore_round_trip() {
        let mut engine = started();
        engine.put_in_inventory("firstObject");
        engine.turn_to("cellar", false).unwrap();
        engine.save().unwrap();

        // Wander off after saving.
        engine.turn_to("start", false).unwrap();
        engine.remove_from_inventory("firstObject");

        assert!(engine.restore().unwrap());
        assert_eq!(engine.current_page_id(), "cellar");
        assert!(engine.is_in_inventory("firstObject"));
        // Restoring re-displays the current page.
        let (text, is_turn) = engine.presentation().prints.last().unwrap();
        assert!(text.contains("dark cellar"));
        assert!(is_turn);
    }

    #[test]
    fn restore_without_a_save_is_a_noop() {
        let mut engine = started();
        let page_before = engine.current_page_id().to_string();
        assert!(!engine.restore().unwrap());
        assert_eq!(engine.current_page_id(), page_before);
    }

    #[test]
    fn restore_merges_saved_vars_over_fresh_defaults() {
        let mut engine = started();
        engine.save().unwrap();

        engine.put_in_inventory("key");
        assert!(engine.restore().unwrap());
        assert!(!engine.is_in_inventory("key"));
        assert_eq!(engine.public_state().vars["visits"], Value::Int(0));
    }

    #[test]
    fn reset_recompiles_and_restarts() {
        let mut engine = started();
        engine.put_in_inventory("firstObject");
        engine.turn_to("cellar", false).unwrap();
        engine.perform_action("firstObject", "Drop").unwrap();

        engine.reset().unwrap();
        assert_eq!(engine.current_page_id(), "start");
        assert_eq!(*engine.counters(), Counters::default());
        assert!(engine.inventory().is_empty());
        assert_eq!(engine.public_state().vars["visits"], Value::Int(0));
    }

    #[test]
    fn hooks_run_around_every_print() {
        let source = r#"Hooked
initscript
    story.before = 0
    story.after = 0
beforeEveryThing
    story.before += 1
afterEveryThing
    story.after += 1
p.start.first
    Begin.
p.next
    Next.
"#;
        let mut engine = Engine::headless(source, StoryFormat::Dedlee).unwrap();
        engine.start().unwrap();
        // start() itself prints, so capture the baseline first.
        let baseline = match engine.public_state().vars["before"] {
            Value::Int(n) => n,
            ref other => panic!("unexpected {other:?}"),
        };

        engine.turn_to("next", false).unwrap();
        assert_eq!(engine.public_state().vars["before"], Value::Int(baseline + 1));
        assert_eq!(engine.public_state().vars["after"], Value::Int(baseline + 1));
    }

    #[test]
    fn page_turn_hooks_only_wrap_turns() {
        let source = r#"Hooked
initscript
    story.turns = 0
afterEveryPageTurn
    story.turns += 1
p.start.first
    Begin.
    pg.aside
        An aside.
p.next
    Next.
"#;
        let mut engine = Engine::headless(source, StoryFormat::Dedlee).unwrap();
        engine.start().unwrap();
        let baseline = match engine.public_state().vars["turns"] {
            Value::Int(n) => n,
            ref other => panic!("unexpected {other:?}"),
        };

        engine.show_paragraph("aside").unwrap();
        assert_eq!(engine.public_state().vars["turns"], Value::Int(baseline));

        engine.turn_to("next", false).unwrap();
        assert_eq!(
            engine.public_state().vars["turns"],
            Value::Int(baseline + 1)
        );
    }

    #[test]
    fn script_navigation_is_drained_not_recursive() {
        let source = r#"Scripted
initscript
    story.turnTo('second')
p.start.first
    Begin.
p.second
    You were sent here.
"#;
        let mut engine = Engine::headless(source, StoryFormat::Dedlee).unwrap();
        engine.start().unwrap();
        assert_eq!(engine.current_page_id(), "second");
    }

    #[test]
    fn runaway_hook_navigation_is_bounded() {
        let source = r#"Loop
afterEveryPageTurn
    story.turnTo('start')
p.start.first
    Around and around.
"#;
        let mut engine = Engine::headless(source, StoryFormat::Dedlee).unwrap();
        assert!(matches!(
            engine.start(),
            Err(EngineError::DirectiveOverflow(_))
        ));
    }

    #[test]
    fn end_game_reaches_the_adapter() {
        let mut engine = started();
        engine.end_game();
        assert!(engine.ended());
        assert!(engine.presentation().ended);
    }

    #[test]
    fn disable_and_enable_forward_link_ids() {
        let mut engine = started();
        engine.disable("cellarLink");
        engine.enable("cellarLink");
        assert_eq!(
            engine.presentation().link_toggles,
            vec![
                ("cellarLink".to_string(), false),
                ("cellarLink".to_string(), true),
            ]
        );
    }
}
