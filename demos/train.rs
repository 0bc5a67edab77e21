// This example trains an autoencoder on random binary vectors and
// compares reconstructions of seen and unseen samples.

// The trained model is then written to disc and loaded back,
// as a separate program would do it.

use log::info;
use microencoder::{ Autoencoder, Tensor };

fn main() -> microencoder::Result<()> {
  env_logger::init();

  let input_size = 8;
  let latent_size = 3;
  let mut rng = rand::thread_rng();

  // Samples drawn from {0,1}^8, test data unseen during training
  let train = Tensor::<f64>::binary(&[10, input_size], &mut rng);
  let test = Tensor::<f64>::binary(&[5, input_size], &mut rng);

  let mut model = Autoencoder::new(input_size, latent_size);

  let epochs = 2000;
  let learning_rate = 0.05;
  for epoch in 0..epochs {
    let loss = model.train_step(&train, learning_rate)?;
    if epoch % 200 == 0 {
      info!("Epoch {epoch} loss: {loss:.6}");
    }
  }

  report("training", &model, &train)?;
  report("test", &model, &test)?;

  // Save and restore
  let path = std::env::temp_dir().join("microencoder-demo.bin");
  model.save(&path)?;
  let restored = Autoencoder::<f64>::load(&path)?;
  assert_eq!(restored.parameters(), model.parameters());
  println!("Model round-tripped through {}", path.display());

  Ok(())
}

fn report(name: &str, model: &Autoencoder<f64>, batch: &Tensor<f64>) -> microencoder::Result<()> {
  println!("\n=== Reconstruction on {name} data ===");
  let reconstructed = model.forward(batch)?.reconstruction;
  let binary = reconstructed.threshold(0.5);
  for (i, ((input, output), bits)) in batch.iter_rows()
    .zip(reconstructed.iter_rows())
    .zip(binary.iter_rows())
    .enumerate()
  {
    let exact = input == bits;
    println!("Sample {i}:");
    println!("Input:         {input:?}");
    println!("Reconstructed: {:?}", output.iter().map(|a| format!("{a:.3}") ).collect::<Vec<_>>());
    println!("Binarized:     {bits:?} {}\n", if exact { "(exact)" } else { "" });
  }
  Ok(())
}
