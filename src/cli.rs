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
use std::io::stdin;
use std::io::stdout;

use clap::Parser;
use duecards::error::Fallible;

use crate::cmd::card::add_card;
use crate::cmd::card::delete_card;
use crate::cmd::card::reset_card;
use crate::cmd::check::check_collection;
use crate::cmd::drill::drill;
use crate::cmd::due::print_due;
use crate::cmd::due::print_next;
use crate::cmd::export::export_collection;
use crate::cmd::stats::StatsFormat;
use crate::cmd::stats::print_stats;
use crate::collection::Collection;

#[derive(Parser)]
#[command(version, about, long_about = None)]
enum Command {
    /// Add a card to a deck.
    Add {
        /// The deck to add the card to.
        deck: String,
        /// The prompt side of the card.
        front: String,
        /// The answer side of the card.
        back: String,
        /// Card ID. Derived from the deck and content if absent.
        #[arg(long)]
        id: Option<String>,
        /// Path to the collection directory. By default, the current working directory is used.
        #[arg(short, long)]
        directory: Option<String>,
    },
    /// Delete a card and its review history.
    Delete {
        card_id: String,
        /// Path to the collection directory. By default, the current working directory is used.
        #[arg(short, long)]
        directory: Option<String>,
    },
    /// Forget a card's scheduling state and make it due now.
    Reset {
        card_id: String,
        /// Path to the collection directory. By default, the current working directory is used.
        #[arg(short, long)]
        directory: Option<String>,
    },
    /// Drill the due cards of a deck.
    Drill {
        deck: String,
        /// Path to the collection directory. By default, the current working directory is used.
        #[arg(short, long)]
        directory: Option<String>,
    },
    /// List the cards of a deck that are due now.
    Due {
        deck: String,
        /// Path to the collection directory. By default, the current working directory is used.
        #[arg(short, long)]
        directory: Option<String>,
    },
    /// Print when a deck next needs attention.
    Next {
        deck: String,
        /// Path to the collection directory. By default, the current working directory is used.
        #[arg(short, long)]
        directory: Option<String>,
    },
    /// Check that every stored memory state is valid.
    Check {
        /// Path to the collection directory. By default, the current working directory is used.
        #[arg(short, long)]
        directory: Option<String>,
    },
    /// Print collection statistics.
    Stats {
        /// Path to the collection directory. By default, the current working directory is used.
        #[arg(short, long)]
        directory: Option<String>,
        /// Which output format to use.
        #[arg(long, default_value_t = StatsFormat::Text)]
        format: StatsFormat,
    },
    /// Export cards, memory states and review history as JSON.
    Export {
        /// Path to the collection directory. By default, the current working directory is used.
        #[arg(short, long)]
        directory: Option<String>,
    },
}

pub async fn entrypoint() -> Fallible<()> {
    let cli: Command = Command::parse();
    match cli {
        Command::Add {
            deck,
            front,
            back,
            id,
            directory,
        } => {
            let coll = Collection::new(directory)?;
            let card_id = add_card(&coll, &deck, &front, &back, id)?;
            println!("{card_id}");
            Ok(())
        }
        Command::Delete { card_id, directory } => {
            let coll = Collection::new(directory)?;
            delete_card(&coll, &card_id)
        }
        Command::Reset { card_id, directory } => {
            let coll = Collection::new(directory)?;
            reset_card(&coll, &card_id)
        }
        Command::Drill { deck, directory } => {
            let coll = Collection::new(directory)?;
            let mut input = stdin().lock();
            let mut output = stdout().lock();
            drill(&coll, &deck, &mut input, &mut output).await?;
            Ok(())
        }
        Command::Due { deck, directory } => {
            let coll = Collection::new(directory)?;
            print_due(&coll, &deck).await
        }
        Command::Next { deck, directory } => {
            let coll = Collection::new(directory)?;
            print_next(&coll, &deck).await
        }
        Command::Check { directory } => {
            let coll = Collection::new(directory)?;
            check_collection(&coll)
        }
        Command::Stats { directory, format } => {
            let coll = Collection::new(directory)?;
            print_stats(&coll, format)
        }
        Command::Export { directory } => {
            let coll = Collection::new(directory)?;
            export_collection(&coll)
        }
    }
}
