pub type Result<T> = rl_store::Result<T>;
