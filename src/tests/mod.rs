mod test_config;
mod test_dataset;
mod test_factorization;
mod test_similarity;

pub fn init() {
    let _ = env_logger::builder().is_test(true).try_init();
}
