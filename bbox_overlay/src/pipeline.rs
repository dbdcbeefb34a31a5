// THEORY:
// The `pipeline` module is the top-level API of the overlay engine. One call to
// `OverlayPipeline::render` is one overlay pass over a `CardBoard`:
//
// 1.  **Scan**: claim a new pass generation, clear old overlays, and read every
//     card's `BBox` text and image `src`. Malformed cards are skipped here.
// 2.  **Probe**: load each image out-of-band on the `ProbePool` to learn its
//     natural size. Completions arrive in any order.
// 3.  **Draw**: as each card's own probe settles, project its box onto the
//     displayed size read at that moment and attach the overlay, but only if
//     the pass is still current and the card still shows the same image.
// 4.  **Settle**: wait for the aggregate settle signal and return a report.
//
// Nothing in a pass is fatal. Each card ends with exactly one `CardOutcome`.

use crate::core_modules::bbox_text::parse_bbox;
use crate::core_modules::board::{CardBoard, CardSlot};
use crate::core_modules::geometry::{BoundingBox, Dimensions, DisplayRect, project_box};
use crate::core_modules::overlay_surface::{OverlaySurface, StrokeStyle};
use crate::core_modules::pass_tracker::{PassToken, PassTracker};
use crate::core_modules::probe::ImageProbe;
use crate::core_modules::settle::{SettleCounts, SettleTracker};
use crate::error::{ConfigError, ParseError};
use crate::parallel_probe::{ProbeJob, ProbePool, ProbeResult};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(10);
const PROBES_PER_CPU: usize = 4;

/// Tunables for an overlay pass.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Upper bound on a single probe. A probe that has not settled by then
    /// counts as failed.
    pub probe_timeout: Duration,
    /// Number of probes allowed in flight at once.
    pub max_in_flight: usize,
    pub stroke: StrokeStyle,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            probe_timeout: DEFAULT_PROBE_TIMEOUT,
            max_in_flight: num_cpus::get().max(1) * PROBES_PER_CPU,
            stroke: StrokeStyle::default(),
        }
    }
}

impl PipelineConfig {
    /// Defaults overridden by `BBOX_PROBE_TIMEOUT_MS`, `BBOX_MAX_IN_FLIGHT`,
    /// `BBOX_STROKE_COLOR` and `BBOX_LINE_WIDTH` when set.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as `from_env`, reading values through `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(value) = lookup("BBOX_PROBE_TIMEOUT_MS") {
            let millis = parse_number::<u64>("BBOX_PROBE_TIMEOUT_MS", &value)?;
            config.probe_timeout = Duration::from_millis(millis);
        }
        if let Some(value) = lookup("BBOX_MAX_IN_FLIGHT") {
            let max = parse_number::<usize>("BBOX_MAX_IN_FLIGHT", &value)?;
            if max == 0 {
                return Err(ConfigError::InvalidValue { key: "BBOX_MAX_IN_FLIGHT", value });
            }
            config.max_in_flight = max;
        }
        if let Some(value) = lookup("BBOX_STROKE_COLOR") {
            config.stroke.color = StrokeStyle::parse_hex(&value)?;
        }
        if let Some(value) = lookup("BBOX_LINE_WIDTH") {
            config.stroke.line_width = parse_number::<u32>("BBOX_LINE_WIDTH", &value)?;
        }

        Ok(config)
    }
}

fn parse_number<T: std::str::FromStr>(key: &'static str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidValue {
        key,
        value: value.to_string(),
    })
}

/// How a single card ended up after a pass.
#[derive(Debug, Clone, PartialEq)]
pub enum CardOutcome {
    /// Overlay attached at this displayed rectangle.
    Drawn(DisplayRect),
    /// `BBox` field absent or unreadable.
    Malformed(Option<ParseError>),
    /// The card has no image element.
    MissingImage,
    /// The probe failed or timed out. Holds the rendered error.
    LoadFailed(String),
    /// Natural size is known but a usable displayed size is not yet.
    Deferred { natural: Dimensions },
    /// The pass was superseded, or the card was removed or recycled, before
    /// its probe settled.
    Cancelled,
}

/// Per-card results and aggregate counts of one pass. Outcomes are listed in
/// settle order, so ids repeat when the page repeats them.
#[derive(Debug, Clone)]
pub struct PassReport {
    pub token: PassToken,
    pub outcomes: Vec<(String, CardOutcome)>,
    pub settle: SettleCounts,
    /// Position in `outcomes` of each deferred card, with what was scanned.
    deferred: Vec<(usize, ScannedCard)>,
}

impl PassReport {
    pub fn outcome(&self, card_id: &str) -> Option<&CardOutcome> {
        self.outcomes
            .iter()
            .find(|(id, _)| id == card_id)
            .map(|(_, outcome)| outcome)
    }

    pub fn drawn(&self) -> usize {
        self.count(|o| matches!(o, CardOutcome::Drawn(_)))
    }

    pub fn skipped(&self) -> usize {
        self.count(|o| matches!(o, CardOutcome::Malformed(_) | CardOutcome::MissingImage))
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, CardOutcome::LoadFailed(_)))
    }

    pub fn deferred(&self) -> usize {
        self.count(|o| matches!(o, CardOutcome::Deferred { .. }))
    }

    pub fn cancelled(&self) -> usize {
        self.count(|o| matches!(o, CardOutcome::Cancelled))
    }

    fn count(&self, pred: impl Fn(&CardOutcome) -> bool) -> usize {
        self.outcomes.iter().filter(|(_, o)| pred(o)).count()
    }
}

/// A card that passed the scan stage and is waiting on its probe.
#[derive(Debug, Clone)]
struct ScannedCard {
    slot: CardSlot,
    id: String,
    src: String,
    bbox: BoundingBox,
}

/// The bounding-box overlay engine.
pub struct OverlayPipeline {
    probe: Arc<dyn ImageProbe>,
    config: PipelineConfig,
    passes: PassTracker,
}

impl OverlayPipeline {
    pub fn new(probe: Arc<dyn ImageProbe>, config: PipelineConfig) -> Self {
        Self {
            probe,
            config,
            passes: PassTracker::new(),
        }
    }

    /// Retires the running pass, if any. Its late completions become no-ops.
    pub fn cancel(&self) {
        self.passes.cancel();
    }

    /// Runs one overlay pass over `board`.
    pub async fn render(&self, board: &CardBoard) -> PassReport {
        // --- 1. Scan ---
        let (token, cards) = board.begin_pass(&self.passes);
        let mut outcomes: Vec<(String, CardOutcome)> = Vec::with_capacity(cards.len());
        let mut scanned: Vec<ScannedCard> = Vec::new();
        let mut deferred: Vec<(usize, ScannedCard)> = Vec::new();

        for (slot, card) in &cards {
            let Some(text) = card.bbox_text() else {
                warn!(card = %card.id, "card has no BBox field, skipping");
                outcomes.push((card.id.clone(), CardOutcome::Malformed(None)));
                continue;
            };
            let bbox = match parse_bbox(text) {
                Ok(bbox) => bbox,
                Err(err) => {
                    warn!(card = %card.id, error = %err, "malformed bounding box, skipping");
                    outcomes.push((card.id.clone(), CardOutcome::Malformed(Some(err))));
                    continue;
                }
            };
            let Some(image) = &card.image else {
                warn!(card = %card.id, "card has no image, skipping");
                outcomes.push((card.id.clone(), CardOutcome::MissingImage));
                continue;
            };
            scanned.push(ScannedCard {
                slot: *slot,
                id: card.id.clone(),
                src: image.src.clone(),
                bbox,
            });
        }

        // --- 2. Probe & 3. Draw ---
        let jobs: Vec<ProbeJob> = scanned
            .iter()
            .enumerate()
            .map(|(index, card)| ProbeJob {
                index,
                src: card.src.clone(),
            })
            .collect();
        let settle = SettleTracker::new(jobs.len());
        let signal = settle.signal();

        if !jobs.is_empty() {
            let pool = ProbePool::new(
                Arc::clone(&self.probe),
                self.config.max_in_flight.min(jobs.len()),
                self.config.probe_timeout,
            );
            pool.settle_all(jobs, &settle, |result| {
                let card = &scanned[result.index];
                let outcome = self.on_probe_settled(board, token, card, result);
                if matches!(outcome, CardOutcome::Deferred { .. }) {
                    deferred.push((outcomes.len(), card.clone()));
                }
                outcomes.push((card.id.clone(), outcome));
            })
            .await;
        }

        // --- 4. Settle ---
        let counts = signal.settled().await;
        let report = PassReport {
            token,
            outcomes,
            settle: counts,
            deferred,
        };
        info!(
            generation = token.generation(),
            cards = cards.len(),
            drawn = report.drawn(),
            skipped = report.skipped(),
            failed = report.failed(),
            deferred = report.deferred(),
            cancelled = report.cancelled(),
            "overlay pass settled"
        );
        report
    }

    fn on_probe_settled(
        &self,
        board: &CardBoard,
        token: PassToken,
        card: &ScannedCard,
        result: ProbeResult,
    ) -> CardOutcome {
        let natural = match result.outcome {
            Ok(natural) => natural,
            Err(err) => {
                warn!(card = %card.id, src = %result.src, error = %err, "image failed to load");
                return CardOutcome::LoadFailed(err.to_string());
            }
        };
        self.draw(board, token, card, natural)
    }

    fn draw(&self, board: &CardBoard, token: PassToken, card: &ScannedCard, natural: Dimensions) -> CardOutcome {
        let stroke = self.config.stroke;
        board
            .draw_if_current(&self.passes, token, card.slot, |element| {
                let Some(image) = &element.image else {
                    return CardOutcome::Cancelled;
                };
                if image.src != card.src {
                    return CardOutcome::Cancelled;
                }
                let displayed = image.displayed.unwrap_or(natural);
                match project_box(natural, displayed, card.bbox) {
                    Ok(rect) => {
                        element.set_overlay(OverlaySurface::draw(displayed, rect, stroke));
                        CardOutcome::Drawn(rect)
                    }
                    Err(_) => CardOutcome::Deferred { natural },
                }
            })
            .unwrap_or(CardOutcome::Cancelled)
    }

    /// Retries every `Deferred` card of `report` using the displayed sizes on
    /// the board now. The natural sizes learned by the pass are reused, so no
    /// image is probed twice. Cards of a superseded pass, or of a board that
    /// has been rescanned since, come back `Cancelled`.
    pub fn resume_deferred(&self, board: &CardBoard, report: &mut PassReport) -> usize {
        let mut drawn = 0;
        let mut still_deferred = Vec::new();
        for (position, card) in std::mem::take(&mut report.deferred) {
            let Some((_, outcome)) = report.outcomes.get_mut(position) else {
                continue;
            };
            let CardOutcome::Deferred { natural } = *outcome else {
                continue;
            };
            let next = self.draw(board, report.token, &card, natural);
            match next {
                CardOutcome::Drawn(_) => drawn += 1,
                CardOutcome::Deferred { .. } => still_deferred.push((position, card)),
                _ => {}
            }
            *outcome = next;
        }
        report.deferred = still_deferred;
        drawn
    }
}
