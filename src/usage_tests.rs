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

#[cfg(test)]
mod tests {

    use crate::config::ModelConfig;
    use crate::fast_als::FastAlsParameters;
    use crate::manager::RecommendationManager;
    use crate::stats::DataDictionary;

    #[test]
    fn programmatic_usage() {

        /* Our input data comprises of ratings that users gave to items. The identifiers used can
           be strings of arbitrary length and structure. */
        let ratings = vec![
            (String::from("alice"), String::from("apple"), 5.0),
            (String::from("alice"), String::from("dog"), 3.0),
            (String::from("alice"), String::from("pony"), 4.0),
            (String::from("bob"), String::from("apple"), 4.0),
            (String::from("bob"), String::from("pony"), 5.0),
            (String::from("charles"), String::from("pony"), 2.0),
            (String::from("charles"), String::from("bike"), 5.0)
        ];

        /* The data dictionary collects all users and items in the order in which they appear
           and acts as the catalog the manager reads its identities and ratings from. */
        let data_dict = DataDictionary::from_ratings(ratings.iter());

        println!(
            "Found {} ratings between {} users and {} items.",
            data_dict.num_interactions(),
            data_dict.num_users(),
            data_dict.num_items(),
        );

        /* We choose the estimator via its configuration, here fast ALS with few factors. */
        let config = ModelConfig::FastAls(FastAlsParameters {
            factors: 4,
            seed: 42,
            ..FastAlsParameters::default()
        });

        /* The manager maps the string identities to the consecutive integer ids the estimator
           works with, and back. */
        let mut manager = RecommendationManager::from_catalog(
            &data_dict,
            |data| config.into_recommender(data),
        ).unwrap();

        /* Fit the model on all ratings. */
        manager.initialize();

        /* Recommend items that bob has not rated yet. */
        let bob = String::from("bob");
        let for_bob = manager.recommend_items(&bob, 2, true).unwrap();
        println!("Recommended for bob: {:?}", for_bob);

        assert_eq!(for_bob.len(), 2);
        assert!(!for_bob.contains(&String::from("apple")));
        assert!(!for_bob.contains(&String::from("pony")));

        /* New users arrive at any time, their interactions update the model online. */
        let dana = String::from("dana");
        manager.add_user(dana.clone()).unwrap();
        manager.on_interaction(&dana, &String::from("bike")).unwrap();

        let for_dana = manager.recommend_items(&dana, 0, true).unwrap();
        println!("Recommended for dana: {:?}", for_dana);

        assert_eq!(for_dana.len(), 3);

        /* Items similar to the pony. */
        let similar = manager.similar_items(&String::from("pony"), 2).unwrap();
        println!("Similar to pony: {:?}", similar);

        assert_eq!(similar.len(), 2);
        assert!(manager.recommend_items(&String::from("eve"), 2, true).is_err());
    }
}
