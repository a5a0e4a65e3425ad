//! In-memory glyph lexicon keyed by signature hash.
//!
//! Persistence is out of scope; this store only upholds the contract the
//! driver relies on: upsert by signature, frequency on recurrence, at most
//! `capacity` distinct entries with the least recently seen evicted first,
//! and final-write-wins annotations.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use glyphloop_types::{Annotation, GlyphFeatures, GlyphSpec, LexiconEntry, OperatorKind};
use tracing::{debug, info};

/// What an [`Lexicon::upsert`] did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpsertOutcome {
    /// A new signature was added, possibly evicting the least recent one.
    Inserted {
        /// Signature evicted to make room, if any.
        evicted: Option<String>,
    },
    /// The signature was already present.
    Recurred {
        /// Frequency after this occurrence.
        frequency: u32,
    },
}

impl UpsertOutcome {
    /// Whether the signature was new to the lexicon.
    pub const fn is_new(&self) -> bool {
        matches!(self, Self::Inserted { .. })
    }
}

#[derive(Debug, Clone)]
struct Slot {
    entry: LexiconEntry,
    /// Monotonic recency stamp; larger is more recent.
    touched: u64,
    labels: Vec<String>,
}

/// Bounded map from signature to [`LexiconEntry`].
#[derive(Debug, Clone)]
pub struct Lexicon {
    slots: HashMap<String, Slot>,
    capacity: usize,
    clock: u64,
}

impl Lexicon {
    /// Create an empty lexicon holding at most `capacity` entries (at
    /// least one).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            slots: HashMap::with_capacity(capacity),
            capacity,
            clock: 0,
        }
    }

    /// Record one occurrence of a glyph.
    ///
    /// A recurring signature increments `frequency` and takes the latest
    /// occurrence's glyph id, tokens, operator and observables together, so
    /// an entry never mixes readings from different occurrences.
    pub fn upsert(
        &mut self,
        spec: &GlyphSpec,
        features: &GlyphFeatures,
        operator: OperatorKind,
        now: DateTime<Utc>,
    ) -> UpsertOutcome {
        self.clock += 1;
        let touched = self.clock;

        if let Some(slot) = self.slots.get_mut(&spec.signature) {
            slot.touched = touched;
            let entry = &mut slot.entry;
            entry.frequency = entry.frequency.saturating_add(1);
            entry.glyph_id.clone_from(&spec.id);
            entry.last_seen = now;
            entry.tokens.clone_from(&features.tokens);
            entry.operator = operator;
            entry.observables = spec.observables;
            debug!(
                signature = %spec.signature,
                frequency = entry.frequency,
                "Lexicon entry recurred"
            );
            return UpsertOutcome::Recurred {
                frequency: entry.frequency,
            };
        }

        let evicted = if self.slots.len() >= self.capacity {
            self.evict_least_recent()
        } else {
            None
        };

        self.slots.insert(
            spec.signature.clone(),
            Slot {
                entry: LexiconEntry {
                    signature: spec.signature.clone(),
                    glyph_id: spec.id.clone(),
                    tokens: features.tokens.clone(),
                    operator,
                    frequency: 1,
                    first_seen: now,
                    last_seen: now,
                    observables: spec.observables,
                    annotation: None,
                },
                touched,
                labels: Vec::new(),
            },
        );
        info!(
            signature = %spec.signature,
            %operator,
            size = self.slots.len(),
            evicted = evicted.as_deref().unwrap_or(""),
            "Lexicon entry added"
        );
        UpsertOutcome::Inserted { evicted }
    }

    /// Attach an annotation, replacing any earlier one.
    ///
    /// Returns `false` (and changes nothing) if the signature is no longer
    /// in the lexicon.
    pub fn apply_annotation(&mut self, signature: &str, annotation: Annotation) -> bool {
        let Some(slot) = self.slots.get_mut(signature) else {
            debug!(signature, "Annotation for evicted entry dropped");
            return false;
        };
        info!(
            signature,
            gloss = %annotation.gloss,
            confidence = annotation.confidence,
            "Annotation applied"
        );
        slot.entry.annotation = Some(annotation);
        true
    }

    /// Attach a human label to an entry. Duplicate labels are ignored.
    pub fn add_label(&mut self, signature: &str, label: &str) -> bool {
        let Some(slot) = self.slots.get_mut(signature) else {
            return false;
        };
        let label = label.trim();
        if !label.is_empty() && !slot.labels.iter().any(|l| l == label) {
            slot.labels.push(label.to_owned());
        }
        true
    }

    /// Human labels attached to an entry.
    pub fn labels(&self, signature: &str) -> &[String] {
        self.slots
            .get(signature)
            .map(|slot| slot.labels.as_slice())
            .unwrap_or_default()
    }

    /// Look up an entry.
    pub fn get(&self, signature: &str) -> Option<&LexiconEntry> {
        self.slots.get(signature).map(|slot| &slot.entry)
    }

    /// Entries ordered from most to least recently seen.
    pub fn entries(&self) -> Vec<&LexiconEntry> {
        let mut slots: Vec<&Slot> = self.slots.values().collect();
        slots.sort_by(|a, b| b.touched.cmp(&a.touched));
        slots.into_iter().map(|slot| &slot.entry).collect()
    }

    /// Number of distinct entries.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Whether the lexicon is empty.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Maximum number of distinct entries.
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    fn evict_least_recent(&mut self) -> Option<String> {
        let oldest = self
            .slots
            .iter()
            .min_by_key(|(_, slot)| slot.touched)
            .map(|(signature, _)| signature.clone())?;
        self.slots.remove(&oldest);
        Some(oldest)
    }
}
