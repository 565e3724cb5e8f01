use warden::utils::errors::WardenError;

fn main() -> Result<(), WardenError> {
    tokio::runtime::Builder::new_multi_thread()
        // Cap the number of blocking threads - under heavy login load the
        // argon hashing can otherwise spawn threads without bound.
        .max_blocking_threads(num_cpus::get())
        .enable_all()
        .build()
        .unwrap()
        .block_on(async {
            warden::lib_main().await
        })
}
