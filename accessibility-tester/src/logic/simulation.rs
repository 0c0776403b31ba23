//! Seeded random sessions over the headless engine.
//!
//! A session is a sequence of user-level steps (shortcuts, clicks on page
//! content, slider changes and page reloads) drawn from a `ChaCha8Rng`. After
//! every step the live engine is checked against the invariants the widget
//! must hold no matter how it was driven.
use accessibility_core::headless::{HeadlessSurface, MemoryStore, RecordingSynth};
use accessibility_core::{
    ACCESSIBILITY_KEY, AccessibilityPreferences, Action, ClickDisposition, ClickTarget,
    ContrastPolicy, Dropdown, ElementKind, Feature, FontScale, LinkCursor, PageFragment,
    RestoreReport, SPEECH_KEY, SpeechPreferences, ToggleEngine, WidgetConfig, ids,
};
use colored::Colorize;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

pub type HeadlessEngine = ToggleEngine<MemoryStore, HeadlessSurface, RecordingSynth>;
pub type Expectation = fn(&SimulationSummary) -> anyhow::Result<()>;

pub const PAGE_TITLE: &str = "Harbour Tours";
pub const PAGE_LINKS: usize = 4;

const SPEECH_TOLERANCE: f64 = 1e-9;

/// Page content the simulated reader can be pointed at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickFixture {
    Paragraph,
    Link,
    Image,
    WidgetButton,
    Excluded,
    Blank,
}

impl ClickFixture {
    const ALL: [Self; 6] = [
        Self::Paragraph,
        Self::Link,
        Self::Image,
        Self::WidgetButton,
        Self::Excluded,
        Self::Blank,
    ];

    #[must_use]
    pub fn target(self) -> ClickTarget {
        match self {
            Self::Paragraph => ClickTarget::new(
                ElementKind::Paragraph,
                "Boats leave every hour from pier four.",
            ),
            Self::Link => ClickTarget {
                href: Some("/book".to_string()),
                ..ClickTarget::new(ElementKind::Link, "Book a tour")
            },
            Self::Image => ClickTarget {
                alt: Some("The harbour at dusk".to_string()),
                ..ClickTarget::new(ElementKind::Image, "")
            },
            Self::WidgetButton => ClickTarget {
                inside_widget: true,
                ..ClickTarget::new(ElementKind::Button, "High Contrast")
            },
            Self::Excluded => ClickTarget::new(ElementKind::Paragraph, "Sponsored content")
                .with_marker("no-screen-reader"),
            Self::Blank => ClickTarget::new(ElementKind::Other, "   "),
        }
    }

    /// Whether the reader may ever speak this element.
    const fn readable(self) -> bool {
        !matches!(self, Self::WidgetButton | Self::Excluded | Self::Blank)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SimStep {
    Shortcut(Action),
    Click(ClickFixture),
    Speech { rate: f64, volume: f64 },
    TestSpeech,
    Reload,
}

impl SimStep {
    #[must_use]
    pub fn label(&self) -> String {
        match self {
            Self::Shortcut(Action::Toggle(feature)) => format!("toggle {}", feature.marker()),
            Self::Shortcut(action) => format!("{action:?}"),
            Self::Click(fixture) => format!("click {fixture:?}"),
            Self::Speech { rate, volume } => format!("speech rate {rate} volume {volume}"),
            Self::TestSpeech => "test speech".to_string(),
            Self::Reload => "reload".to_string(),
        }
    }
}

/// Which steps a session draws and how often.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionMix {
    Everything,
    FontOnly,
    ReaderClicks,
    ReloadHeavy,
}

impl ActionMix {
    fn draw(self, rng: &mut ChaCha8Rng) -> SimStep {
        match self {
            Self::Everything => draw_any(rng),
            Self::FontOnly => match rng.gen_range(0..100) {
                0..45 => SimStep::Shortcut(Action::IncreaseFont),
                45..85 => SimStep::Shortcut(Action::DecreaseFont),
                85..92 => SimStep::Shortcut(Action::ResetFont),
                _ => SimStep::Reload,
            },
            Self::ReaderClicks => match rng.gen_range(0..100) {
                0..15 => SimStep::Shortcut(Action::ToggleScreenReader),
                15..75 => SimStep::Click(draw_fixture(rng)),
                75..85 => SimStep::Shortcut(Action::ReadPage),
                85..95 => SimStep::TestSpeech,
                _ => SimStep::Reload,
            },
            Self::ReloadHeavy => {
                if rng.gen_bool(0.3) {
                    SimStep::Reload
                } else {
                    draw_any(rng)
                }
            }
        }
    }
}

fn draw_fixture(rng: &mut ChaCha8Rng) -> ClickFixture {
    ClickFixture::ALL
        .choose(rng)
        .copied()
        .unwrap_or(ClickFixture::Paragraph)
}

fn draw_any(rng: &mut ChaCha8Rng) -> SimStep {
    match rng.gen_range(0..100) {
        0..40 => {
            let feature = Feature::ALL
                .choose(rng)
                .copied()
                .unwrap_or(Feature::HighContrast);
            SimStep::Shortcut(Action::Toggle(feature))
        }
        40..48 => SimStep::Shortcut(Action::IncreaseFont),
        48..56 => SimStep::Shortcut(Action::DecreaseFont),
        56..58 => SimStep::Shortcut(Action::ResetFont),
        58..64 => SimStep::Shortcut(Action::ToggleScreenReader),
        64..67 => SimStep::Shortcut(Action::ReadPage),
        67..71 => SimStep::Shortcut(Action::ToggleMenu),
        71..73 => SimStep::Shortcut(Action::ResetAll),
        73..76 => SimStep::Shortcut(if rng.gen_bool(0.5) {
            Action::NextLink
        } else {
            Action::PreviousLink
        }),
        76..86 => SimStep::Click(draw_fixture(rng)),
        86..92 => SimStep::Speech {
            rate: f64::from(rng.gen_range(5_u8..=20)) / 10.0,
            volume: f64::from(rng.gen_range(0_u8..=10)) / 10.0,
        },
        92..95 => SimStep::TestSpeech,
        _ => SimStep::Reload,
    }
}

/// A scripted session: random steps followed by a fixed finale.
#[derive(Debug, Clone)]
pub struct SimulationPlan {
    pub config: WidgetConfig,
    pub steps: usize,
    pub mix: ActionMix,
    pub speech_supported: bool,
    /// Raw values written to storage before the first page load.
    pub initial_records: Vec<(&'static str, &'static str)>,
    pub finale: Vec<SimStep>,
    pub expectations: Vec<Expectation>,
}

impl SimulationPlan {
    #[must_use]
    pub fn new(mix: ActionMix) -> Self {
        Self {
            config: WidgetConfig::default(),
            steps: 40,
            mix,
            speech_supported: true,
            initial_records: Vec::new(),
            finale: Vec::new(),
            expectations: Vec::new(),
        }
    }

    #[must_use]
    pub const fn with_steps(mut self, steps: usize) -> Self {
        self.steps = steps;
        self
    }

    #[must_use]
    pub fn with_config(mut self, config: WidgetConfig) -> Self {
        self.config = config;
        self
    }

    #[must_use]
    pub const fn without_speech(mut self) -> Self {
        self.speech_supported = false;
        self
    }

    #[must_use]
    pub fn with_record(mut self, key: &'static str, raw: &'static str) -> Self {
        self.initial_records.push((key, raw));
        self
    }

    #[must_use]
    pub fn then(mut self, step: SimStep) -> Self {
        self.finale.push(step);
        self
    }

    #[must_use]
    pub fn with_expectation(mut self, expectation: Expectation) -> Self {
        self.expectations.push(expectation);
        self
    }
}

#[derive(Debug, Clone, Default)]
pub struct SimulationSummary {
    pub seed: u64,
    pub steps: Vec<String>,
    pub violations: Vec<String>,
    pub final_preferences: AccessibilityPreferences,
    pub final_speech: SpeechPreferences,
    pub stored_preferences: Option<String>,
    pub stored_speech: Option<String>,
    pub boots: usize,
    pub recovered_boots: usize,
    pub utterances: Vec<String>,
    pub max_concurrent: usize,
    pub notices: usize,
    pub reads: usize,
    pub suppressed_clicks: usize,
    pub peak_font_level: u8,
    pub menu_open: bool,
}

impl SimulationSummary {
    #[must_use]
    pub fn reloads(&self) -> usize {
        self.boots.saturating_sub(1)
    }
}

/// Runs plans against a fresh in-memory page per seed.
#[derive(Debug, Clone, Copy)]
pub struct SessionSimulator {
    verbose: bool,
}

impl SessionSimulator {
    #[must_use]
    pub const fn new(verbose: bool) -> Self {
        Self { verbose }
    }

    #[must_use]
    pub fn run_plan(&self, plan: &SimulationPlan, seed: u64) -> SimulationSummary {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let store = MemoryStore::default();
        for (key, raw) in &plan.initial_records {
            store.insert_raw(key, raw);
        }

        let mut session = Session::boot(plan, store, seed);
        for _ in 0..plan.steps {
            let step = plan.mix.draw(&mut rng);
            session.apply(&step, self.verbose);
        }
        for step in &plan.finale {
            session.apply(step, self.verbose);
        }
        session.finish()
    }
}

struct Session {
    config: WidgetConfig,
    speech_supported: bool,
    store: MemoryStore,
    engine: HeadlessEngine,
    menu: Dropdown,
    links: LinkCursor,
    summary: SimulationSummary,
}

impl Session {
    fn boot(plan: &SimulationPlan, store: MemoryStore, seed: u64) -> Self {
        let mut summary = SimulationSummary {
            seed,
            ..SimulationSummary::default()
        };
        let (engine, report) = load_page(&plan.config, &store, plan.speech_supported);
        summary.boots = 1;
        if report.recovered {
            summary.recovered_boots += 1;
        }
        let mut session = Self {
            config: plan.config.clone(),
            speech_supported: plan.speech_supported,
            store,
            engine,
            menu: Dropdown::default(),
            links: LinkCursor::new(PAGE_LINKS),
            summary,
        };
        session.check("boot");
        session
    }

    fn apply(&mut self, step: &SimStep, verbose: bool) {
        let label = step.label();
        if verbose {
            println!("    {} {}", "↳".dimmed(), label);
        }
        match step {
            SimStep::Shortcut(action) => self.dispatch(*action),
            SimStep::Click(fixture) => self.click(*fixture),
            SimStep::Speech { rate, volume } => {
                let saved = self.engine.update_speech(*rate, *volume);
                if !speech_matches(saved, self.engine.speech_preferences()) {
                    self.violation(&label, "slider values were not stored".to_string());
                }
            }
            SimStep::TestSpeech => {
                self.engine.test_speech();
            }
            SimStep::Reload => self.reload(),
        }
        if self.engine.take_unsupported_notice() {
            self.summary.notices += 1;
        }
        self.summary.steps.push(label.clone());
        self.check(&label);
    }

    fn dispatch(&mut self, action: Action) {
        match action {
            Action::Toggle(feature) => {
                self.engine.toggle(feature);
                if feature == Feature::HighContrast
                    && self.config.contrast_policy == ContrastPolicy::ExclusiveHighContrast
                    && (self.engine.is_enabled(Feature::InvertColors)
                        || self.engine.is_enabled(Feature::SaturateColors))
                {
                    self.violation(
                        "toggle high-contrast",
                        "colour filters survived a contrast toggle".to_string(),
                    );
                }
            }
            Action::IncreaseFont => {
                self.engine.increase_font();
            }
            Action::DecreaseFont => {
                self.engine.decrease_font();
            }
            Action::ResetFont => self.engine.reset_font(),
            Action::ToggleScreenReader => self.engine.toggle_screen_reader(),
            Action::ReadPage => {
                if self.engine.state().screen_reader {
                    self.engine.read_entire_page(PAGE_TITLE, &page_fragments());
                }
            }
            Action::ToggleMenu => self.menu.toggle(),
            Action::ResetAll => self.engine.reset_all(),
            Action::NextLink | Action::PreviousLink => {
                let index = if action == Action::NextLink {
                    self.links.next()
                } else {
                    self.links.previous()
                };
                if index.is_none_or(|i| i >= PAGE_LINKS) {
                    self.violation("link navigation", format!("cursor landed on {index:?}"));
                }
            }
            Action::ScrollDown | Action::ScrollUp => {}
        }
    }

    fn click(&mut self, fixture: ClickFixture) {
        let reader_on = self.engine.state().screen_reader;
        let disposition = self.engine.handle_click(&fixture.target());
        let label = format!("click {fixture:?}");
        match &disposition {
            ClickDisposition::Read(_) if !fixture.readable() => {
                self.violation(&label, "reader spoke an element it must skip".to_string());
            }
            ClickDisposition::Read(_) => self.summary.reads += 1,
            ClickDisposition::Inactive if reader_on => {
                self.violation(&label, "active reader ignored a click".to_string());
            }
            _ => {}
        }
        if disposition.suppresses_default() {
            self.summary.suppressed_clicks += 1;
        }
        if !reader_on && disposition != ClickDisposition::Inactive {
            self.violation(&label, format!("inactive reader handled {disposition:?}"));
        }
    }

    fn reload(&mut self) {
        let before = (self.engine.snapshot(), self.engine.speech_preferences());
        self.harvest_speech();

        let (engine, report) = load_page(&self.config, &self.store, self.speech_supported);
        self.engine = engine;
        self.menu = Dropdown::default();
        self.links = LinkCursor::new(PAGE_LINKS);
        self.summary.boots += 1;
        if report.recovered {
            self.summary.recovered_boots += 1;
        }

        let after = (self.engine.snapshot(), self.engine.speech_preferences());
        if before.0 != after.0 {
            self.violation(
                "reload",
                format!("display settings changed from {:?} to {:?}", before.0, after.0),
            );
        }
        if !speech_matches(before.1, after.1) {
            self.violation(
                "reload",
                format!("speech settings changed from {:?} to {:?}", before.1, after.1),
            );
        }
    }

    fn harvest_speech(&mut self) {
        let synth = self.engine.narrator().synth();
        self.summary
            .utterances
            .extend(synth.spoken().iter().map(|u| u.text.clone()));
        self.summary.max_concurrent = self.summary.max_concurrent.max(synth.max_concurrent());
    }

    fn check(&mut self, label: &str) {
        let font = self.engine.state().font;
        self.summary.peak_font_level = self
            .summary
            .peak_font_level
            .max(font.increase_level())
            .max(font.decrease_level());
        for problem in check_invariants(&self.engine, &self.store) {
            self.violation(label, problem);
        }
    }

    fn violation(&mut self, label: &str, problem: String) {
        let step = self.summary.steps.len();
        self.summary
            .violations
            .push(format!("step {step} ({label}): {problem}"));
    }

    fn finish(mut self) -> SimulationSummary {
        self.harvest_speech();
        self.summary.final_preferences = self.engine.snapshot();
        self.summary.final_speech = self.engine.speech_preferences();
        self.summary.stored_preferences = self.store.raw(ACCESSIBILITY_KEY);
        self.summary.stored_speech = self.store.raw(SPEECH_KEY);
        self.summary.menu_open = self.menu.is_open();
        self.summary
    }
}

/// Construct an engine over shared storage and run the startup restore, the
/// way a page load does.
#[must_use]
pub fn load_page(
    config: &WidgetConfig,
    store: &MemoryStore,
    speech_supported: bool,
) -> (HeadlessEngine, RestoreReport) {
    let synth = if speech_supported {
        RecordingSynth::default()
    } else {
        RecordingSynth::unsupported()
    };
    let mut engine = ToggleEngine::new(
        config.clone(),
        store.clone(),
        HeadlessSurface::default(),
        synth,
    );
    let report = engine.restore();
    (engine, report)
}

#[must_use]
pub fn page_fragments() -> Vec<PageFragment> {
    vec![
        PageFragment::new(ElementKind::Heading(1), PAGE_TITLE),
        PageFragment::new(ElementKind::Paragraph, "Boats leave every hour from pier four."),
        PageFragment::new(ElementKind::Link, "Book a tour"),
        PageFragment::new(ElementKind::ListItem, "ok"),
    ]
}

fn speech_matches(a: SpeechPreferences, b: SpeechPreferences) -> bool {
    (a.rate - b.rate).abs() < SPEECH_TOLERANCE && (a.volume - b.volume).abs() < SPEECH_TOLERANCE
}

/// Everything that must hold between any two events.
#[must_use]
pub fn check_invariants(engine: &HeadlessEngine, store: &MemoryStore) -> Vec<String> {
    let mut problems = Vec::new();
    let state = engine.state();
    let font = state.font;
    let surface = engine.surface();

    if font.increase_level() > 0 && font.decrease_level() > 0 {
        problems.push(format!(
            "both font levels set (+{} / -{})",
            font.increase_level(),
            font.decrease_level()
        ));
    }
    if font.increase_level().max(font.decrease_level()) > font.max_level() {
        problems.push(format!("font level beyond {}", font.max_level()));
    }

    for feature in Feature::ALL {
        if surface.indicator_active(feature.indicator_id()) != engine.is_enabled(feature) {
            problems.push(format!("{} indicator out of sync", feature.marker()));
        }
    }
    if surface.indicator_active(ids::SCREEN_READER_BTN) != state.screen_reader {
        problems.push("screen reader indicator out of sync".to_string());
    }
    if surface.control_visible(ids::READ_PAGE_BTN) != state.screen_reader {
        problems.push("read page control visibility out of sync".to_string());
    }
    for (id, level) in [
        (ids::FONT_INCREASE_LEVEL, font.increase_level()),
        (ids::FONT_DECREASE_LEVEL, font.decrease_level()),
    ] {
        let shown = surface.indicator_text(id).unwrap_or_default();
        if shown != FontScale::badge(level) {
            problems.push(format!("{id} shows '{shown}' for level {level}"));
        }
    }

    let live = engine.snapshot();
    match store.raw(ACCESSIBILITY_KEY) {
        Some(raw) => match serde_json::from_str::<AccessibilityPreferences>(&raw) {
            Ok(saved) if saved == live => {}
            Ok(saved) => problems.push(format!("stored {saved:?} differs from live {live:?}")),
            Err(err) => problems.push(format!("stored record unreadable: {err}")),
        },
        None if !live.is_default() => problems.push("live settings were never stored".to_string()),
        None => {}
    }

    if engine.narrator().synth().max_concurrent() > 1 {
        problems.push("two utterances played at once".to_string());
    }
    problems
}
