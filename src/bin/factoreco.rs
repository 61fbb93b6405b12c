/**
 * FactoReco
 * Copyright (C) 2026 The FactoReco Authors
 *
 * This program is free software: you can redistribute it and/or modify
 * it under the terms of the GNU General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * This program is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 * GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License
 * along with this program. If not, see <http://www.gnu.org/licenses/>.
 */

use std::env;
use std::error::Error;
use std::process;
use std::time::Instant;

use getopts::Options;

use factoreco::config::ModelConfig;
use factoreco::io;
use factoreco::manager::RecommendationManager;
use factoreco::stats::DataDictionary;
use factoreco::types::Rating;
use factoreco::utils;

struct Run {
    ratings_path: String,
    output_path: Option<String>,
    config: ModelConfig,
    test_percent: usize,
    how_many: usize,
    seed: u64,
}

fn main() {

    let args: Vec<String> = env::args().collect();
    let program = args[0].clone();

    let mut opts = Options::new();
    opts.optopt("i", "inputfile", "Input file name (required). The input file must contain a \
        user, an item and an optional rating per line, separated by tabs. Lines without a \
        rating count as implicit feedback.", "PATH");
    opts.optopt("m", "model", "Model to train, one of biased_sgd, fast_als, item_knn or \
        memory_based (optional, defaults to fast_als).", "NAME");
    opts.optopt("c", "config", "JSON file with the model and its parameters (optional, \
        overrides --model).", "PATH");
    opts.optopt("t", "test-percent", "Percentage of ratings held out for evaluation (optional, \
        defaults to 10).", "NUMBER");
    opts.optopt("k", "num-items", "Number of items to recommend per user, also the cutoff for \
        the hit rate (optional, defaults to 10).", "NUMBER");
    opts.optopt("s", "seed", "Seed for the train/test split (optional, defaults to 0).", "NUMBER");
    opts.optopt("o", "outputfile", "Output file name (optional, recommendations will be written \
        to stdout by default).", "PATH");
    opts.optflag("h", "help", "Print this help menu");

    let matches = match opts.parse(&args[1..]) {
        Ok(matches) => matches,
        Err(failure) => {
            let hint = failure.to_string();
            return print_usage_and_exit(&program, opts, Some(&hint))
        },
    };

    if matches.opt_present("h") {
        return print_usage_and_exit(&program, opts, None);
    }

    let ratings_path = match matches.opt_str("i") {
        Some(path) => path,
        None => return print_usage_and_exit(
            &program,
            opts,
            Some("Please specify an inputfile via --inputfile."),
        ),
    };

    let config = match matches.opt_str("c") {
        Some(config_path) => match ModelConfig::from_file(&config_path) {
            Ok(config) => config,
            Err(failure) => {
                let hint = format!("Could not read config {}: {}", config_path, failure);
                return print_usage_and_exit(&program, opts, Some(&hint))
            },
        },
        None => {
            let name = matches.opt_str("m").unwrap_or_else(|| String::from("fast_als"));
            match ModelConfig::from_name(&name) {
                Some(ModelConfig::ItemKnn(mut parameters)) => {
                    parameters.num_threads = num_cpus::get();
                    ModelConfig::ItemKnn(parameters)
                },
                Some(config) => config,
                None => {
                    let hint = format!("Unknown model '{}'.", name);
                    return print_usage_and_exit(&program, opts, Some(&hint))
                },
            }
        },
    };

    let test_percent: usize = match matches.opt_get_default("t", 10) {
        Ok(test_percent) if test_percent <= 100 => test_percent,
        Ok(test_percent) => {
            let hint = format!("Problem with option 't': {} is not a percentage", test_percent);
            return print_usage_and_exit(&program, opts, Some(&hint))
        },
        Err(failure) => {
            let hint = format!("Problem with option 't': {}", failure.to_string());
            return print_usage_and_exit(&program, opts, Some(&hint))
        },
    };

    let how_many: usize = match matches.opt_get_default("k", 10) {
        Ok(how_many) => how_many,
        Err(failure) => {
            let hint = format!("Problem with option 'k': {}", failure.to_string());
            return print_usage_and_exit(&program, opts, Some(&hint))
        },
    };

    let seed: u64 = match matches.opt_get_default("s", 0) {
        Ok(seed) => seed,
        Err(failure) => {
            let hint = format!("Problem with option 's': {}", failure.to_string());
            return print_usage_and_exit(&program, opts, Some(&hint))
        },
    };

    let run = Run { ratings_path, output_path: matches.opt_str("o"), config, test_percent, how_many, seed };

    if let Err(failure) = train_and_evaluate(run) {
        eprintln!("{}", failure);
        process::exit(1);
    }
}

fn print_usage_and_exit(
    program: &str,
    opts: Options,
    hint: Option<&str>
) {

    if let Some(hint) = hint {
        eprintln!("\n{}\n", hint);
    }

    let brief = format!("Usage: {} [options]", program);
    eprint!("{}", opts.usage(&brief));
}

fn train_and_evaluate(run: Run) -> Result<(), Box<dyn Error>> {

    println!("Reading {}", run.ratings_path);

    let ratings = io::read_ratings(&run.ratings_path)?;

    // Identities come from all ratings, so held-out users and items are known to the model.
    let data_dict = DataDictionary::from_ratings(ratings.iter());

    println!(
        "Found {} ratings between {} users and {} items.",
        data_dict.num_interactions(),
        data_dict.num_users(),
        data_dict.num_items(),
    );

    let mut rng = utils::seeded_rng(run.seed);
    let (train, test) = utils::train_test_split(ratings, run.test_percent as f64 / 100.0, &mut rng);

    println!("Training {} on {} ratings, {} held out", run.config.name(), train.len(), test.len());

    let config = run.config;
    let mut manager = RecommendationManager::new(
        data_dict.users().to_vec(),
        data_dict.items().to_vec(),
        train,
        |data| config.into_recommender(data),
    )?;

    let training_start = Instant::now();
    manager.initialize();

    println!(
        "Training loss {:.4}, {}ms training time",
        manager.recommender().loss(),
        utils::to_millis(training_start.elapsed()),
    );

    let held_out = test.iter()
        .map(|(user, item, score)| manager.to_rating(user, item, *score))
        .collect::<Result<Vec<Rating>, _>>()?;

    if !held_out.is_empty() {
        println!(
            "Test RMSE {:.4}, hit rate@{} {:.4}",
            manager.recommender().rmse(&held_out),
            run.how_many,
            manager.recommender().hit_rate(&held_out, run.how_many, true),
        );
    }

    println!("Writing recommendations...");

    let mut recommendations = Vec::with_capacity(manager.users().len());
    for user in manager.users() {
        let items = manager.recommend_items(user, run.how_many, true)?;
        recommendations.push((user.clone(), items));
    }

    io::write_recommendations(&recommendations, run.output_path)?;

    Ok(())
}
