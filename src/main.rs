fn main() -> anyhow::Result<()> {
    city_viz::flow::run()
}
