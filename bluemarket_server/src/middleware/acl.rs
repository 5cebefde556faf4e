//! Access control list middleware for the BlueMarket server.
//! This middleware can be placed on any route or service behind the [`super::JwtMiddlewareFactory`].
//!
//! It checks the role in the request's JWT claims against the role kinds allowed on the route. If the role is one of
//! them, the request is allowed to continue. Otherwise, a 403 Forbidden response is returned.

use std::{future::Future, pin::Pin, rc::Rc};

use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    Error,
    HttpMessage,
};
use futures::future::{ok, Ready};
use log::*;

use crate::{
    auth::{JwtClaims, RoleKind},
    errors::{AuthError, ServerError},
};

pub struct AclMiddlewareFactory {
    allowed: Vec<RoleKind>,
}

impl AclMiddlewareFactory {
    pub fn new(allowed: &[RoleKind]) -> Self {
        AclMiddlewareFactory { allowed: allowed.to_vec() }
    }
}

impl<S, B> Transform<S, ServiceRequest> for AclMiddlewareFactory
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Transform = AclMiddlewareService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ok(AclMiddlewareService { allowed: self.allowed.clone(), service: Rc::new(service) })
    }
}

pub struct AclMiddlewareService<S> {
    allowed: Vec<RoleKind>,
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for AclMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>>>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);
        let allowed = self.allowed.clone();
        Box::pin(async move {
            let role = req.extensions().get::<JwtClaims>().map(|c| c.role).ok_or_else(|| {
                warn!("🔑️ No JWT claims found in request extensions");
                ServerError::from(AuthError::MissingToken)
            })?;
            if allowed.contains(&RoleKind::from(&role)) {
                service.call(req).await
            } else {
                debug!("🔑️ {role} may not access {}", req.path());
                Err(ServerError::InsufficientPermissions(format!("{role} may not access this resource")).into())
            }
        })
    }
}
