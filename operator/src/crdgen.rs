use kube::CustomResourceExt;

use apachebench_operator::bench::ApacheBench;

fn main() -> Result<(), serde_yaml::Error> {
    print!("{}", serde_yaml::to_string(&ApacheBench::crd())?);
    Ok(())
}
