fn main() -> anyhow::Result<()> {
    city_walk::start()
}
