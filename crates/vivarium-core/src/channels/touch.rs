//! Petting the pet.
//!
//! Touches are rate-limited twice over: a short cooldown between touches
//! and a bucket of touches that refills a while after it runs dry. A touch
//! below maximum friendship nudges friendship up and may pay a coin bonus.
//! At maximum friendship a touch only produces a cosmetic reaction, except
//! that a mature, happy child may be offered evolution.

use chrono::Duration;
use rust_decimal::Decimal;
use tracing::{debug, info};
use vivarium_types::{Channel, LifeCycle, Narrative, Notification, Origin};

use super::Tick;
use crate::catchup::{self, CatchUp};
use crate::config::{TouchConfig, minutes};
use crate::state::CareState;

/// Reactions shown when friendship is already full.
pub const CONTENT_REACTIONS: &[&str] = &[
    "purrs contentedly",
    "rolls over for more",
    "nuzzles your hand",
    "blinks slowly at you",
];

/// Flavour text for the two non-evolving outcomes of an eligible touch.
const SHY_REACTION: &str = "looks at you as if it wants to say something";
const RESTLESS_REACTION: &str = "seems restless, as if something is changing";

/// Percentile rolls for one touch, drawn by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TouchRolls {
    /// Coin bonus roll, `0..100`.
    pub bonus: u32,
    /// Index into [`CONTENT_REACTIONS`].
    pub reaction: u32,
    /// Evolution roll, `0..100`.
    pub evolution: u32,
}

/// The result of one touch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TouchOutcome {
    /// No interactive pet to touch.
    Ignored,
    /// The bucket is empty.
    CapReached,
    /// Too soon after the previous touch.
    CoolingDown,
    /// Friendship went up.
    Affection {
        /// Bonus coins paid (0 if none).
        coins: u32,
    },
    /// Friendship was already full; a reaction was shown.
    Content {
        /// The reaction text.
        reaction: &'static str,
    },
    /// The pet is ready to evolve, pending confirmation.
    EvolutionOffered,
    /// The offer was confirmed and the pet evolved. Reported by the
    /// caretaker once the offer is answered.
    Evolved,
    /// The offer was declined; the life cycle is unchanged.
    EvolutionDeclined,
}

/// Whether a pet at full friendship qualifies for the evolution roll.
fn evolution_eligible(state: &CareState, tick: &Tick<'_>, config: &TouchConfig) -> bool {
    let pet = &state.pet;
    let old_enough = pet.born_at.is_some_and(|born| {
        tick.now.signed_duration_since(born) >= Duration::hours(i64::from(config.evolution_min_age_hours))
    });
    pet.life_cycle == Some(LifeCycle::Child)
        && pet.current_friendship > Decimal::from(config.evolution_min_friendship)
        && pet.current_wellness > config.evolution_min_wellness
        && old_enough
}

/// Touch the pet.
pub fn touch(state: &mut CareState, tick: &Tick<'_>, rolls: TouchRolls) -> (TouchOutcome, Vec<Notification>) {
    let config = &tick.config.touch;
    if !state.pet.decays() || state.pet.is_leaving {
        return (TouchOutcome::Ignored, Vec::new());
    }
    if state.touch.count >= config.max_touches {
        return (TouchOutcome::CapReached, Vec::new());
    }
    let cooldown = Duration::seconds(i64::from(config.cooldown_secs));
    if let Some(last) = state.touch.last_touch {
        let since = tick.now.signed_duration_since(last);
        if since >= Duration::zero() && since < cooldown {
            return (TouchOutcome::CoolingDown, Vec::new());
        }
    }

    state.touch.count = state.touch.count.saturating_add(1);
    state.touch.last_touch = Some(tick.now);
    if state.touch.count >= config.max_touches {
        state.ledger.set(Channel::TouchCooldown, Some(tick.now));
        debug!("Touch bucket exhausted");
    }

    let ceiling = state
        .pet
        .max_friendship
        .checked_sub(config.friendship_gain)
        .unwrap_or(Decimal::ZERO);
    if state.pet.current_friendship <= ceiling {
        state.pet.gain_friendship(config.friendship_gain);
        if rolls.bonus < config.coin_percent {
            info!(coins = config.coins, "Touch paid a coin bonus");
            let note = Notification::narrative(
                tick.now,
                Origin::Player,
                Narrative::CoinBonus {
                    coins: config.coins,
                },
                format!("found {} coin(s)", config.coins),
            );
            return (
                TouchOutcome::Affection {
                    coins: config.coins,
                },
                vec![note],
            );
        }
        return (TouchOutcome::Affection { coins: 0 }, Vec::new());
    }

    if evolution_eligible(state, tick, config) {
        let shy = config.shy_percent;
        let offer_from = 100_u32.saturating_sub(config.evolution_percent);
        if rolls.evolution >= offer_from {
            info!("Evolution offered");
            let note = Notification::narrative(
                tick.now,
                Origin::Player,
                Narrative::EvolutionOffered,
                "your pet is ready to evolve",
            );
            return (TouchOutcome::EvolutionOffered, vec![note]);
        }
        let reaction = if rolls.evolution < shy {
            SHY_REACTION
        } else {
            RESTLESS_REACTION
        };
        return (TouchOutcome::Content { reaction }, Vec::new());
    }

    let len = u32::try_from(CONTENT_REACTIONS.len()).unwrap_or(1).max(1);
    let index = usize::try_from(rolls.reaction.checked_rem(len).unwrap_or(0)).unwrap_or(0);
    let reaction = CONTENT_REACTIONS.get(index).copied().unwrap_or("is happy");
    (TouchOutcome::Content { reaction }, Vec::new())
}

/// Poll the bucket refill.
///
/// Refills immediately if the pet is absent or its time is stopped,
/// otherwise once the reset period has passed since the bucket ran dry.
pub fn reset_poll(state: &mut CareState, tick: &Tick<'_>) -> Vec<Notification> {
    if !state.pet.decays() {
        if state.touch.count > 0 {
            debug!("Touch bucket refilled (pet unavailable)");
        }
        state.touch.count = 0;
        state.ledger.clear(Channel::TouchCooldown);
        return Vec::new();
    }
    if state.touch.count < tick.config.touch.max_touches {
        return Vec::new();
    }
    let interval = minutes(tick.config.touch.reset_minutes);
    match catchup::assess(state.ledger.get(Channel::TouchCooldown), tick.now, interval) {
        CatchUp::Baseline => state.ledger.set(Channel::TouchCooldown, Some(tick.now)),
        CatchUp::Waiting => {}
        CatchUp::Due { .. } => {
            state.touch.count = 0;
            state.ledger.clear(Channel::TouchCooldown);
            debug!("Touch bucket refilled");
        }
    }
    Vec::new()
}
