// ============================================================
// Layer 5: Moment Transform (Adam-style)
// ============================================================
// Rescales each raw gradient by running estimates of its first
// and second moments:
//
//   m = β1*m + (1-β1)*g          (mean)
//   v = β2*v + (1-β2)*g²         (uncentred variance)
//   m̂ = m / (1 - β1^t)           (bias correction)
//   v̂ = v / (1 - β2^t)
//   θ = θ - step * m̂ / (√v̂ + ε)
//
// Moment state lives in the optimizer only and is never written to
// a checkpoint. Resuming from a checkpoint starts from zero moments.
//
// Plugged into Burn through `SimpleOptimizer`, so `OptimizerAdaptor`
// handles walking the module tree and matching gradients to
// parameters.
//
// Reference: Kingma & Ba (2015) Adam

use burn::{
    module::AutodiffModule,
    optim::{adaptor::OptimizerAdaptor, SimpleOptimizer},
    prelude::*,
    record::Record,
    tensor::backend::AutodiffBackend,
    LearningRate,
};

#[derive(Config, Debug)]
pub struct MomentTransformConfig {
    #[config(default = 0.9)]
    pub beta_1:  f32,
    #[config(default = 0.999)]
    pub beta_2:  f32,
    #[config(default = 1e-8)]
    pub epsilon: f32,
}

impl MomentTransformConfig {
    pub fn init<B: AutodiffBackend, M: AutodiffModule<B>>(
        &self,
    ) -> OptimizerAdaptor<MomentTransform, M, B> {
        OptimizerAdaptor::from(MomentTransform {
            beta_1:  self.beta_1,
            beta_2:  self.beta_2,
            epsilon: self.epsilon,
        })
    }
}

#[derive(Clone, Debug)]
pub struct MomentTransform {
    beta_1:  f32,
    beta_2:  f32,
    epsilon: f32,
}

/// Per-parameter moment estimates.
#[derive(Record, Clone)]
pub struct MomentState<B: Backend, const D: usize> {
    pub time:     usize,
    pub moment_1: Tensor<B, D>,
    pub moment_2: Tensor<B, D>,
}

impl MomentTransform {
    /// Update the moments with `grad` and return the rescaled step
    /// direction together with the new state.
    pub fn transform<B: Backend, const D: usize>(
        &self,
        grad:  Tensor<B, D>,
        state: Option<MomentState<B, D>>,
    ) -> (Tensor<B, D>, MomentState<B, D>) {
        let (time, moment_1, moment_2) = match state {
            Some(state) => (
                state.time + 1,
                state.moment_1.mul_scalar(self.beta_1)
                    .add(grad.clone().mul_scalar(1.0 - self.beta_1)),
                state.moment_2.mul_scalar(self.beta_2)
                    .add(grad.powf_scalar(2.0).mul_scalar(1.0 - self.beta_2)),
            ),
            None => (
                1,
                grad.clone().mul_scalar(1.0 - self.beta_1),
                grad.powf_scalar(2.0).mul_scalar(1.0 - self.beta_2),
            ),
        };

        let correction_1 = 1.0 - self.beta_1.powf(time as f32);
        let correction_2 = 1.0 - self.beta_2.powf(time as f32);

        let direction = moment_1
            .clone()
            .div_scalar(correction_1)
            .div(
                moment_2
                    .clone()
                    .div_scalar(correction_2)
                    .sqrt()
                    .add_scalar(self.epsilon),
            );

        (direction, MomentState { time, moment_1, moment_2 })
    }
}

impl<B: Backend> SimpleOptimizer<B> for MomentTransform {
    type State<const D: usize> = MomentState<B, D>;

    fn step<const D: usize>(
        &self,
        lr:     LearningRate,
        tensor: Tensor<B, D>,
        grad:   Tensor<B, D>,
        state:  Option<Self::State<D>>,
    ) -> (Tensor<B, D>, Option<Self::State<D>>) {
        let (direction, state) = self.transform(grad, state);
        (tensor - direction.mul_scalar(lr), Some(state))
    }

    fn to_device<const D: usize>(mut state: Self::State<D>, device: &B::Device) -> Self::State<D> {
        state.moment_1 = state.moment_1.to_device(device);
        state.moment_2 = state.moment_2.to_device(device);
        state
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type TestBackend = NdArray;

    fn transform() -> MomentTransform {
        MomentTransform {
            beta_1:  0.9,
            beta_2:  0.999,
            epsilon: 1e-8,
        }
    }

    fn values(t: Tensor<TestBackend, 1>) -> Vec<f32> {
        t.into_data().to_vec::<f32>().unwrap()
    }

    #[test]
    fn test_first_step_is_sign_of_gradient() {
        let device = Default::default();
        let params = Tensor::<TestBackend, 1>::from_floats([1.0, 1.0, 1.0], &device);
        let grad = Tensor::<TestBackend, 1>::from_floats([2.0, -3.0, 0.5], &device);

        let (updated, state) =
            SimpleOptimizer::<TestBackend>::step(&transform(), 0.1, params, grad, None);

        let updated = values(updated);
        for (got, want) in updated.iter().zip([0.9, 1.1, 0.9]) {
            assert!((got - want).abs() < 1e-5, "{got} != {want}");
        }
        assert_eq!(state.map(|s| s.time), Some(1));
    }

    #[test]
    fn test_constant_gradient_keeps_unit_direction() {
        let device = Default::default();
        let optimizer = transform();
        let mut state = None;
        let mut direction = Tensor::<TestBackend, 1>::zeros([1], &device);

        for _ in 0..5 {
            let grad = Tensor::<TestBackend, 1>::from_floats([4.0], &device);
            let (d, s) = optimizer.transform(grad, state);
            direction = d;
            state = Some(s);
        }

        assert!((values(direction)[0] - 1.0).abs() < 1e-4);
        assert_eq!(state.map(|s| s.time), Some(5));
    }

    #[test]
    fn test_zero_gradient_does_not_move_parameters() {
        let device = Default::default();
        let params = Tensor::<TestBackend, 1>::from_floats([0.25, -0.75], &device);
        let grad = Tensor::<TestBackend, 1>::zeros([2], &device);

        let (updated, _) =
            SimpleOptimizer::<TestBackend>::step(&transform(), 0.5, params, grad, None);
        assert_eq!(values(updated), vec![0.25, -0.75]);
    }
}
