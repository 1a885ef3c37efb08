use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::action::{Action, Context};
use crate::error::Rejection;
use crate::event::GameEvent;
use crate::state::{Game, GamePhase, Gift, GiftId, GiftState, Player, PlayerId};
use crate::turn::Rotation;

/// A gift can change hands at most this many times.
pub const STEAL_CAP: u8 = 3;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    pub game: Game,
    pub events: Vec<GameEvent>,
}

/// Applies one action to the game. Never mutates its input: on success the
/// returned [`Outcome`] carries a full replacement state with the emitted
/// events already appended to its history; on rejection nothing changed.
pub fn apply(game: &Game, action: &Action, ctx: &Context) -> Result<Outcome, Rejection> {
    let mut next = game.clone();
    let mut events = Vec::new();

    match action {
        Action::Join {
            player_id,
            name,
            joined_at,
        } => join(&mut next, player_id, name, *joined_at, &mut events)?,
        Action::OpenSubmissions => open_submissions(&mut next, ctx, &mut events)?,
        Action::SubmitGift {
            gift_id,
            product_url,
            hint,
            image_url,
            title,
        } => submit_gift(
            &mut next,
            ctx,
            gift_id,
            product_url,
            hint,
            image_url.clone(),
            title.clone(),
            &mut events,
        )?,
        Action::Start => start(&mut next, ctx, &mut events)?,
        Action::ChooseGift { gift_id } => choose_gift(&mut next, ctx, gift_id, &mut events)?,
        Action::StealGift { gift_id } => steal_gift(&mut next, ctx, gift_id, &mut events)?,
    }

    next.history.extend(events.iter().cloned());
    Ok(Outcome { game: next, events })
}

fn join(
    game: &mut Game,
    player_id: &PlayerId,
    name: &str,
    joined_at: u64,
    events: &mut Vec<GameEvent>,
) -> Result<(), Rejection> {
    if !matches!(game.phase, GamePhase::Lobby) {
        return Err(Rejection::InvalidPhase);
    }

    let name = name.trim();
    if name.is_empty() {
        return Err(Rejection::InvalidName);
    }

    let lowered = name.to_lowercase();
    if game.players.iter().any(|p| p.name.to_lowercase() == lowered) {
        return Err(Rejection::DuplicateName);
    }

    game.players.push(Player {
        id: player_id.clone(),
        name: name.to_string(),
        joined_at,
    });
    events.push(GameEvent::PlayerJoined {
        player_id: player_id.clone(),
        name: name.to_string(),
    });
    Ok(())
}

fn open_submissions(
    game: &mut Game,
    ctx: &Context,
    events: &mut Vec<GameEvent>,
) -> Result<(), Rejection> {
    if !ctx.privileged {
        return Err(Rejection::NotHost);
    }
    if !matches!(game.phase, GamePhase::Lobby) {
        return Err(Rejection::InvalidPhase);
    }
    if game.players.is_empty() {
        return Err(Rejection::NoPlayers);
    }

    game.phase = GamePhase::Submissions;
    events.push(GameEvent::SubmissionsOpened);
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn submit_gift(
    game: &mut Game,
    ctx: &Context,
    gift_id: &GiftId,
    product_url: &str,
    hint: &str,
    image_url: Option<String>,
    title: Option<String>,
    events: &mut Vec<GameEvent>,
) -> Result<(), Rejection> {
    if !matches!(game.phase, GamePhase::Submissions) {
        return Err(Rejection::InvalidPhase);
    }
    let actor = member(game, ctx)?;

    // Resubmission edits the existing entry in place; the gift id is fixed
    // by the first submission.
    let stored_id = match game.gifts.iter_mut().find(|g| g.submitted_by == actor) {
        Some(gift) => {
            gift.product_url = product_url.to_string();
            gift.hint = hint.to_string();
            gift.image_url = image_url;
            gift.title = title;
            gift.id.clone()
        }
        None => {
            game.gifts.push(Gift {
                id: gift_id.clone(),
                submitted_by: actor.clone(),
                product_url: product_url.to_string(),
                hint: hint.to_string(),
                image_url,
                title,
                opened_by: None,
                held_by: None,
                stolen_count: 0,
                stolen_from: None,
                state: GiftState::Unopened,
            });
            gift_id.clone()
        }
    };

    events.push(GameEvent::GiftSubmitted {
        player_id: actor,
        gift_id: stored_id,
    });
    Ok(())
}

fn start(game: &mut Game, ctx: &Context, events: &mut Vec<GameEvent>) -> Result<(), Rejection> {
    if !ctx.privileged {
        return Err(Rejection::NotHost);
    }
    if !matches!(game.phase, GamePhase::Submissions) {
        return Err(Rejection::InvalidPhase);
    }
    if game.players.is_empty() {
        return Err(Rejection::NoPlayers);
    }
    if game
        .players
        .iter()
        .any(|p| game.gift_by_submitter(&p.id).is_none())
    {
        return Err(Rejection::MissingGifts);
    }

    let mut order: Vec<PlayerId> = game.players.iter().map(|p| p.id.clone()).collect();
    let mut rng = ChaCha8Rng::seed_from_u64(game.seed);
    order.shuffle(&mut rng);

    game.rotation = Rotation::start(order.clone());
    game.phase = GamePhase::InProgress;
    events.push(GameEvent::GameStarted { turn_order: order });
    if let Some(first) = game.rotation.active().cloned() {
        events.push(GameEvent::TurnChanged { player_id: first });
    }
    Ok(())
}

fn choose_gift(
    game: &mut Game,
    ctx: &Context,
    gift_id: &GiftId,
    events: &mut Vec<GameEvent>,
) -> Result<(), Rejection> {
    if !matches!(game.phase, GamePhase::InProgress) {
        return Err(Rejection::InvalidPhase);
    }
    let actor = active_actor(game, ctx)?;

    let gift = game
        .gifts
        .iter_mut()
        .find(|g| g.id == *gift_id)
        .ok_or(Rejection::UnknownGift)?;
    if !matches!(gift.state, GiftState::Unopened) {
        return Err(Rejection::GiftAlreadyOpened);
    }

    gift.state = GiftState::Opened;
    gift.opened_by = Some(actor.clone());
    gift.held_by = Some(actor.clone());
    events.push(GameEvent::GiftOpened {
        player_id: actor.clone(),
        gift_id: gift_id.clone(),
    });

    close_steal_window(game, &actor);
    resolve_turn(game, &actor, None, events);
    Ok(())
}

fn steal_gift(
    game: &mut Game,
    ctx: &Context,
    gift_id: &GiftId,
    events: &mut Vec<GameEvent>,
) -> Result<(), Rejection> {
    if !matches!(game.phase, GamePhase::InProgress) {
        return Err(Rejection::InvalidPhase);
    }
    let actor = active_actor(game, ctx)?;

    let gift_index = game
        .gifts
        .iter()
        .position(|g| g.id == *gift_id)
        .ok_or(Rejection::UnknownGift)?;
    if !matches!(game.gifts[gift_index].state, GiftState::Opened) {
        return Err(Rejection::GiftNotOpened);
    }
    let holder = game.gifts[gift_index]
        .held_by
        .clone()
        .ok_or(Rejection::GiftNotOpened)?;
    // The active player never holds a gift: their first acquisition is the
    // turn they are taking right now.
    debug_assert_ne!(holder, actor);
    if game.gifts[gift_index].stolen_count >= STEAL_CAP {
        return Err(Rejection::StealCapReached);
    }
    if game.gifts[gift_index].stolen_from.as_ref() == Some(&actor) {
        return Err(Rejection::ImmediateStealBackForbidden);
    }

    close_steal_window(game, &actor);

    let gift = &mut game.gifts[gift_index];
    gift.held_by = Some(actor.clone());
    gift.stolen_count += 1;
    gift.stolen_from = Some(holder.clone());
    events.push(GameEvent::GiftStolen {
        from: holder.clone(),
        to: actor.clone(),
        gift_id: gift_id.clone(),
    });

    resolve_turn(game, &actor, Some(holder), events);
    Ok(())
}

fn member(game: &Game, ctx: &Context) -> Result<PlayerId, Rejection> {
    let actor = ctx.actor.as_ref().ok_or(Rejection::UnknownPlayer)?;
    if game.player(actor).is_none() {
        return Err(Rejection::UnknownPlayer);
    }
    Ok(actor.clone())
}

fn active_actor(game: &Game, ctx: &Context) -> Result<PlayerId, Rejection> {
    let actor = member(game, ctx)?;
    if game.rotation.active() != Some(&actor) {
        return Err(Rejection::NotActivePlayer);
    }
    Ok(actor)
}

/// The anti-steal-back window closes as soon as the dispossessed player
/// completes any action of their own.
fn close_steal_window(game: &mut Game, actor: &PlayerId) {
    for gift in game.gifts.iter_mut() {
        if gift.stolen_from.as_ref() == Some(actor) {
            gift.stolen_from = None;
        }
    }
}

/// Turn resolution after an accepted choose or steal. The actor's forced
/// entry (if any) is consumed; a steal owes the victim the next turn; a
/// choose outside a chain advances the cursor. Completion wins over both.
fn resolve_turn(
    game: &mut Game,
    actor: &PlayerId,
    victim: Option<PlayerId>,
    events: &mut Vec<GameEvent>,
) {
    game.rotation.serve(actor);
    if let Some(victim) = victim {
        game.rotation.demand(victim);
    }

    if game.is_complete() {
        game.phase = GamePhase::Finished;
        events.push(GameEvent::GameFinished);
        return;
    }

    if !game.rotation.in_forced_chain() {
        game.rotation.advance();
    }
    if let Some(next) = game.rotation.active().cloned() {
        events.push(GameEvent::TurnChanged { player_id: next });
    }
}
