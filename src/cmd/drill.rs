// Copyright 2025 Fernando Borretti
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
use std::io::BufRead;
use std::io::Write;

use duecards::clock::Clock;
use duecards::error::Fallible;
use duecards::error::SchedulerError;
use duecards::session::Session;
use duecards::session::SessionSummary;
use duecards::store::sqlite::SessionId;
use duecards::types::card::DeckId;
use duecards::types::rating::Rating;

use crate::collection::Collection;

/// Drill the due cards of a deck at the terminal.
///
/// Every rating is saved as soon as it is given, and logged right after.
/// The session log is opened with the first review and closed when the
/// drill ends, for any reason.
pub async fn drill<C: Clock, R: BufRead, W: Write>(
    coll: &Collection<C>,
    deck: &str,
    input: &mut R,
    output: &mut W,
) -> Fallible<SessionSummary> {
    let deck_id = DeckId::new(deck);
    let mut session = Session::start(&coll.store, &deck_id, coll.clock.now())
        .await?
        .with_policy(coll.config.policy());
    if session.is_empty() {
        writeln!(output, "No cards due.")?;
        return Ok(session.finish()?);
    }

    let mut session_log = None;
    let outcome = review_loop(coll, &mut session, &mut session_log, input, output).await;
    close_log(coll, session_log, outcome)?;
    let summary = if session.is_complete() {
        session.finish()?
    } else {
        session.abandon()
    };

    let counts = summary.counts;
    writeln!(
        output,
        "Reviewed {} cards: {} again, {} hard, {} good, {} easy.",
        counts.total(),
        counts.again,
        counts.hard,
        counts.good,
        counts.easy
    )?;
    if summary.unreviewed > 0 {
        writeln!(output, "{} cards left for later.", summary.unreviewed)?;
    }
    Ok(summary)
}

/// Close the session log, if one was opened. An error from the drill
/// itself takes precedence over one from closing the log.
fn close_log<C: Clock>(
    coll: &Collection<C>,
    session_log: Option<SessionId>,
    outcome: Fallible<()>,
) -> Fallible<()> {
    let Some(session_id) = session_log else {
        return outcome;
    };
    match (outcome, coll.store.close_session(session_id, coll.clock.now())) {
        (Err(e), Err(close)) => {
            log::warn!("Failed to close session {session_id}: {close}");
            Err(e)
        }
        (Err(e), Ok(())) => Err(e),
        (Ok(()), closed) => Ok(closed?),
    }
}

async fn review_loop<C: Clock, R: BufRead, W: Write>(
    coll: &Collection<C>,
    session: &mut Session,
    session_log: &mut Option<SessionId>,
    input: &mut R,
    output: &mut W,
) -> Fallible<()> {
    while let Some(card) = session.current_card().cloned() {
        writeln!(
            output,
            "[{}/{}] Q: {}",
            session.position() + 1,
            session.len(),
            card.front()
        )?;
        writeln!(output, "[press enter to reveal, q to quit]")?;
        match read_line(input)? {
            None => return Ok(()),
            Some(line) if is_quit(&line) => return Ok(()),
            Some(_) => {}
        }
        writeln!(output, "A: {}", card.back())?;
        let Some(rating) = read_rating(input, output)? else {
            return Ok(());
        };
        let state = session
            .submit_rating(&coll.store, rating, coll.clock.now())
            .await?;
        if let Some(event) = session.events().last() {
            let session_id = match *session_log {
                Some(session_id) => session_id,
                None => {
                    let session_id = coll
                        .store
                        .open_session(session.deck_id(), session.started_at())?;
                    *session_log = Some(session_id);
                    session_id
                }
            };
            coll.store.append_review(session_id, event)?;
        }
        writeln!(output, "Next review at {}.", state.due_at)?;
    }
    Ok(())
}

/// Prompt until a valid rating is given. `None` means the user quit.
fn read_rating<R: BufRead, W: Write>(input: &mut R, output: &mut W) -> Fallible<Option<Rating>> {
    loop {
        writeln!(output, "Rating: (1 = Again, 2 = Hard, 3 = Good, 4 = Easy)")?;
        let Some(line) = read_line(input)? else {
            return Ok(None);
        };
        if is_quit(&line) {
            return Ok(None);
        }
        match parse_rating(&line) {
            Ok(rating) => return Ok(Some(rating)),
            Err(e) => writeln!(output, "{e}")?,
        }
    }
}

/// Accepts button numbers as well as names.
fn parse_rating(line: &str) -> Result<Rating, SchedulerError> {
    let line = line.trim();
    match line.parse::<u8>() {
        Ok(number) => Rating::try_from(number),
        Err(_) => line.parse::<Rating>(),
    }
}

fn read_line<R: BufRead>(input: &mut R) -> Fallible<Option<String>> {
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line))
}

fn is_quit(line: &str) -> bool {
    line.trim().eq_ignore_ascii_case("q")
}
