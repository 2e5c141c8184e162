fn main() -> anyhow::Result<()> {
    sales_pulse_lib::run()
}
