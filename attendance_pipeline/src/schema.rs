// Mirrors migrations/{sqlite,postgres}; keep the three in step.

diesel::table! {
    attraction_raw (name, city) {
        name -> Text,
        city -> Text,
        country -> Nullable<Text>,
        annual_visitors -> BigInt,
        observation_year -> Nullable<Integer>,
        provenance -> Text,
    }
}

diesel::table! {
    population_raw (city, as_of) {
        city -> Text,
        population -> BigInt,
        as_of -> Date,
        provenance -> Text,
    }
}

diesel::table! {
    attraction_features (attraction_name, city) {
        attraction_name -> Text,
        city -> Text,
        country -> Nullable<Text>,
        annual_visitors -> BigInt,
        population -> BigInt,
    }
}

diesel::table! {
    model_registry (version) {
        version -> BigInt,
        trained_at -> Timestamp,
        model_kind -> Text,
        coefficient -> Double,
        intercept -> Double,
        r2 -> Double,
        rmse -> Double,
        mae -> Double,
        n_samples -> BigInt,
        artifact_path -> Text,
    }
}

diesel::allow_tables_to_appear_in_same_query!(
    attraction_features,
    attraction_raw,
    model_registry,
    population_raw,
);
